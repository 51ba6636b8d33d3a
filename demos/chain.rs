use signal_net::format_id;
use signal_net::graph::LogicDepth;
use signal_net::logic::{Logic, LogicCircuit, LogicGate};

fn main() {
    let circuit = LogicCircuit::new("chain".to_string());

    // AND(AND(a, b), c)
    let inner = circuit.insert_gate(Logic::And, "inner".into()).unwrap();
    let outer = circuit.insert_gate(Logic::And, "outer".into()).unwrap();
    circuit.connect(inner.output(), outer.get_input(0)).unwrap();

    inner.get_input(1).set_state(true).unwrap();
    outer.get_input(1).set_state(true).unwrap();
    println!("{circuit}");

    inner.get_input(0).set_state(true).unwrap();
    println!("{circuit}");
    assert!(outer.state());

    // Then a row of inverters hanging off the outer gate
    let mut prev: LogicGate = outer;
    for i in 0..3 {
        let inv = circuit.insert_gate(Logic::Not, format_id!("inv_{i}")).unwrap();
        circuit.connect(prev.output(), inv.get_input(0)).unwrap();
        prev = inv;
    }

    let depth = circuit.get_analysis::<LogicDepth<_>>().unwrap();
    for gate in depth.topological_order() {
        println!(
            "{} level {} -> {}",
            gate.get_name(),
            depth.get_depth(&gate).unwrap_or(0),
            u8::from(gate.state())
        );
    }
}
