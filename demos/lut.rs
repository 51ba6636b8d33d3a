use signal_net::logic::{Logic, LogicCircuit};
use signal_net::truth_table::TruthTable;

fn main() {
    let circuit = LogicCircuit::new("example".to_string());

    // A 2-input LUT holding the NAND table
    let mut table = TruthTable::from_bits(2, 7).unwrap();
    println!("NAND table: {table}");

    // Let's make it an AND gate by inverting the lookup table
    table.invert();
    let lut = circuit.insert_gate(Logic::Lut(table), "inst_0".into()).unwrap();

    for (a, b) in [(false, false), (true, false), (true, true)] {
        lut.get_input(0).set_state(a).unwrap();
        lut.get_input(1).set_state(b).unwrap();
        assert_eq!(lut.state(), a && b);
    }

    // Print the circuit
    println!("{circuit}");
}
