use bitvec::{slice::BitSlice, vec::BitVec};
use signal_net::circuit::Circuit;
use signal_net::instance::{Identifier, Instantiable};

/// A cell library defined outside the crate
#[derive(Debug, Clone)]
enum Cell {
    And(usize),
    Mux,
}

impl Instantiable for Cell {
    fn get_name(&self) -> Identifier {
        match self {
            Cell::And(n) => format!("AND{n}").into(),
            Cell::Mux => "MUX2".into(),
        }
    }

    fn get_input_ports(&self) -> impl IntoIterator<Item = Identifier> {
        match self {
            Cell::And(n) => (0..*n)
                .map(|i| Identifier::new(format!("I{i}")))
                .collect::<Vec<_>>(),
            Cell::Mux => ["S", "A", "B"].map(Identifier::from).to_vec(),
        }
    }

    fn get_output_ports(&self) -> impl IntoIterator<Item = Identifier> {
        std::iter::once(Identifier::from("Y"))
    }

    fn evaluate(&self, inputs: &BitSlice) -> BitVec {
        let y = match self {
            Cell::And(_) => inputs.all(),
            Cell::Mux => {
                if inputs[0] {
                    inputs[2]
                } else {
                    inputs[1]
                }
            }
        };
        BitVec::repeat(y, 1)
    }
}

fn main() {
    let circuit: Circuit<Cell> = Circuit::new("variants".to_string());

    let and = circuit.insert_gate(Cell::And(3), "and3".into()).unwrap();
    let mux = circuit.insert_gate(Cell::Mux, "mux".into()).unwrap();
    circuit.connect(and.output(), mux.get_input(2)).unwrap();

    for pin in and.inputs() {
        pin.set_state(true).unwrap();
    }
    mux.get_input(0).set_state(true).unwrap();
    assert!(mux.state());

    if let Some(table) = Cell::Mux.truth_table() {
        println!("MUX2 table: {table}");
    }
    println!("{circuit}");
}
