use signal_net::gate::Gate;
use signal_net::logic::Logic;

fn main() {
    // Construct an AND gate, then subscribe it to its inputs
    let gate = Gate::new(Logic::And, "g".into());
    gate.initialize().unwrap();

    // Watch the output
    gate.output().add_listener(|state| println!("output is now {}", u8::from(state)));

    gate.get_input(0).set_state(true).unwrap();
    assert!(!gate.state());

    gate.get_input(1).set_state(true).unwrap();
    assert!(gate.state());

    gate.get_input(0).set_state(false).unwrap();
    assert!(!gate.state());

    println!("{gate}");
}
