use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spice_netlist::*;

/// An RC ladder with `stages` sections driven by one source
fn rc_ladder(stages: usize) -> Circuit {
    let mut circuit = Circuit::new(format!("RC ladder {}", stages));
    circuit.voltage_source(1, "n0", 0, Parameters::new().value("DC").value(5));
    for i in 0..stages {
        circuit.resistor(i, format!("n{}", i), format!("n{}", i + 1), "1k");
        circuit.capacitor(i, format!("n{}", i + 1), 0, "1n");
    }
    circuit
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("rc_ladder", size), size, |b, &size| {
            b.iter(|| rc_ladder(black_box(size)));
        });
    }

    group.finish();
}

fn bench_node_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_derivation");

    for size in [10, 100, 1000].iter() {
        let circuit = rc_ladder(*size);
        group.bench_with_input(BenchmarkId::new("rebuild", size), size, |b, _| {
            b.iter(|| {
                // Registration leaves the node mapping stale
                let mut stale = circuit.clone();
                stale.resistor("extra", "n0", 0, "1meg");
                black_box(stale.nodes().len())
            });
        });
    }

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");

    let circuit = rc_ladder(500);
    group.bench_function("circuit_500_stages", |b| {
        b.iter(|| black_box(circuit.to_string()));
    });

    group.bench_function("simulation_500_stages", |b| {
        let mut simulation = CircuitSimulation::new(&circuit);
        simulation.save(["n500"]);
        simulation.tran("1n", "10u");
        b.iter(|| black_box(simulation.to_string()));
    });

    group.finish();
}

criterion_group!(benches, bench_registration, bench_node_derivation, bench_rendering);
criterion_main!(benches);
