use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use serialctl::os::{OsStrategy, OsVariant};
use serialctl::{BaudRate, CharacterLength, ConfigurationValue, FlowControl, Parity, StopBits};
use std::time::Duration;

fn sample_values() -> Vec<ConfigurationValue> {
    vec![
        ConfigurationValue::BaudRate(BaudRate::new(9600).unwrap()),
        ConfigurationValue::Parity(Parity::Even),
        ConfigurationValue::CharacterLength(CharacterLength::new(7)),
        ConfigurationValue::StopBits(StopBits::Two),
        ConfigurationValue::FlowControl(FlowControl::XonXoff),
    ]
}

pub fn bench_configure_commands(c: &mut Criterion) {
    let values = sample_values();

    for (variant, device) in [
        (OsVariant::Linux, "COM3"),
        (OsVariant::Mac, "/dev/tty.usbserial"),
        (OsVariant::Windows, "COM3"),
    ] {
        let strategy = variant.strategy();
        let identity = strategy.resolve_device(device).unwrap();

        c.bench_function(&format!("configure_commands_{}", variant.name()), |b| {
            b.iter(|| {
                for value in &values {
                    black_box(strategy.configure_command(black_box(&identity), value));
                }
            })
        });
    }
}

pub fn bench_com_label(c: &mut Criterion) {
    c.bench_function("com_port_number", |b| {
        b.iter(|| black_box(serialctl::os::com_port_number(black_box("com12:"))))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_configure_commands, bench_com_label
}
criterion_main!(benches);
