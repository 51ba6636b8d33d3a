use signal_net::format_id;
use signal_net::graph::MultiDiGraph;
use signal_net::logic::{Logic, LogicCircuit, LogicGate};

fn ripple_adder() -> LogicCircuit {
    let circuit = LogicCircuit::new("ripple_adder".to_string());
    let bitwidth = 4;

    let mut carry: Option<LogicGate> = None;
    for i in 0..bitwidth {
        // A full adder out of two half adders
        let s1 = circuit.insert_gate(Logic::Xor, format_id!("s1_{i}")).unwrap();
        let c1 = circuit.insert_gate(Logic::And, format_id!("c1_{i}")).unwrap();
        let s2 = circuit.insert_gate(Logic::Xor, format_id!("s2_{i}")).unwrap();
        let c2 = circuit.insert_gate(Logic::And, format_id!("c2_{i}")).unwrap();
        let cout = circuit.insert_gate(Logic::Or, format_id!("cout_{i}")).unwrap();

        circuit.connect(s1.output(), s2.get_input(0)).unwrap();
        circuit.connect(s1.output(), c2.get_input(0)).unwrap();

        // Connect with the prev carry
        if let Some(carry) = &carry {
            circuit.connect(carry.output(), s2.get_input(1)).unwrap();
            circuit.connect(carry.output(), c2.get_input(1)).unwrap();
        }

        circuit.connect(c1.output(), cout.get_input(0)).unwrap();
        circuit.connect(c2.output(), cout.get_input(1)).unwrap();
        carry = Some(cout);
    }

    circuit
}

fn main() {
    let circuit = ripple_adder();
    eprintln!("{circuit}");
    let analysis = circuit.get_analysis::<MultiDiGraph<_>>().unwrap();
    let graph = analysis.get_graph();
    let dot = petgraph::dot::Dot::with_config(graph, &[]);
    println!("{dot}");
}
