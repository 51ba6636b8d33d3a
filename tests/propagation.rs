use proptest::prelude::*;
use signal_net::error::Error;
use signal_net::format_id;
use signal_net::gate::Gate;
use signal_net::instance::Instantiable;
use signal_net::logic::{Logic, LogicCircuit, LogicGate};
use signal_net::propagation;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A chain of BUF gates, each driving the next
fn buffer_chain(len: usize) -> LogicCircuit {
    let circuit = LogicCircuit::new("chain".to_string());
    let mut prev: Option<LogicGate> = None;
    for i in 0..len {
        let buf = circuit.insert_gate(Logic::Buf, format_id!("buf_{i}")).unwrap();
        if let Some(prev) = prev {
            circuit.connect(prev.output(), buf.get_input(0)).unwrap();
        }
        prev = Some(buf);
    }
    circuit
}

#[test]
fn unchanged_state_notifies_nobody() {
    let g = LogicGate::build(Logic::And, "g".into()).unwrap();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    g.get_input(0).add_listener(move |_| c.set(c.get() + 1));

    assert_eq!(g.get_input(0).set_state(false), Ok(false));
    assert_eq!(calls.get(), 0);

    assert_eq!(g.get_input(0).set_state(true), Ok(true));
    assert_eq!(g.get_input(0).set_state(true), Ok(false));
    assert_eq!(calls.get(), 1);
}

#[test]
fn listeners_fire_once_in_order() {
    let g = LogicGate::build(Logic::Buf, "g".into()).unwrap();
    let order = Rc::new(RefCell::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = order.clone();
        g.output().add_listener(move |_| order.borrow_mut().push(tag));
    }
    g.get_input(0).set_state(true).unwrap();
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn gate_listener_runs_before_later_observers() {
    // The gate registered on its input first, so an observer added later already sees the new output
    let g = LogicGate::build(Logic::Not, "inv".into()).unwrap();
    let seen = Rc::new(Cell::new(None));
    let s = seen.clone();
    let out = g.output().clone();
    g.get_input(0).add_listener(move |_| s.set(Some(out.state())));
    g.get_input(0).set_state(true).unwrap();
    assert_eq!(seen.get(), Some(false));
}

#[test]
fn fan_out_reaches_every_input() {
    let circuit = LogicCircuit::new("fan_out".to_string());
    let src = circuit.insert_gate(Logic::Buf, "src".into()).unwrap();
    let left = circuit.insert_gate(Logic::Not, "left".into()).unwrap();
    let right = circuit.insert_gate(Logic::Buf, "right".into()).unwrap();
    circuit.connect(src.output(), left.get_input(0)).unwrap();
    circuit.connect(src.output(), right.get_input(0)).unwrap();
    assert_eq!(src.output().fan_out().len(), 2);

    src.get_input(0).set_state(true).unwrap();
    assert!(left.get_input(0).state());
    assert!(right.get_input(0).state());
    assert!(!left.state());
    assert!(right.state());
}

#[test]
fn chained_and_gates() {
    let circuit = LogicCircuit::new("and_chain".to_string());
    let inner = circuit.insert_gate(Logic::And, "inner".into()).unwrap();
    let outer = circuit.insert_gate(Logic::And, "outer".into()).unwrap();
    circuit.connect(inner.output(), outer.get_input(0)).unwrap();

    inner.get_input(1).set_state(true).unwrap();
    outer.get_input(1).set_state(true).unwrap();
    assert!(!outer.state());

    inner.get_input(0).set_state(true).unwrap();
    assert!(inner.state());
    assert!(outer.state());
}

#[test]
fn cached_inputs_persist() {
    let g = LogicGate::build(Logic::And, "g".into()).unwrap();
    g.get_input(1).set_state(true).unwrap();

    let mut outputs = Vec::new();
    for v in [true, false, true] {
        g.get_input(0).set_state(v).unwrap();
        outputs.push(g.state());
    }
    assert_eq!(outputs, vec![true, false, true]);
}

/// Checks that every wire agrees with its driver and every gate with its inputs
fn assert_settled(circuit: &LogicCircuit) {
    for connection in circuit.connections() {
        assert_eq!(
            connection.src().state(),
            connection.target().state(),
            "{connection}"
        );
    }
    for gate in circuit.gates() {
        assert_eq!(gate.output_states(), gate.evaluate(), "{}", gate.get_name());
    }
}

#[test]
fn long_chain_settles() {
    let circuit = buffer_chain(100);
    circuit.first().unwrap().get_input(0).set_state(true).unwrap();
    assert!(circuit.gates().all(|g| g.state()));
    assert_settled(&circuit);
}

#[test]
fn chain_longer_than_change_limit_settles() {
    // Every pin of an acyclic chain changes once, however long the chain is
    let len = 2 * propagation::DEFAULT_MAX_CHANGES + 1;
    assert_eq!(propagation::max_changes(), propagation::DEFAULT_MAX_CHANGES);
    let circuit = buffer_chain(len);
    let head = circuit.first().unwrap();
    let tail = circuit.last().unwrap();

    assert_eq!(head.get_input(0).set_state(true), Ok(true));
    assert!(tail.state());
    assert_settled(&circuit);

    assert_eq!(head.get_input(0).set_state(false), Ok(true));
    assert!(circuit.gates().all(|g| !g.state()));
    assert_settled(&circuit);
}

#[test]
fn change_limit_does_not_cut_chains() {
    let circuit = buffer_chain(40);
    let head = circuit.first().unwrap();

    let previous = propagation::set_max_changes(1);
    assert_eq!(previous, propagation::DEFAULT_MAX_CHANGES);
    head.get_input(0).set_state(true).unwrap();
    assert!(circuit.last().unwrap().state());
    assert_settled(&circuit);
    propagation::set_max_changes(previous);
}

#[test]
fn raw_feedback_loop_at_default_limit() {
    assert_eq!(propagation::max_changes(), propagation::DEFAULT_MAX_CHANGES);
    let inv = LogicGate::build(Logic::Not, "inv".into()).unwrap();
    assert!(inv.state());

    // An inverter driving itself never settles
    assert_eq!(
        inv.output().connect(inv.get_input(0)),
        Err(Error::Unsettled {
            pin: "inv.A".into(),
            limit: propagation::DEFAULT_MAX_CHANGES
        })
    );
    assert_eq!(inv.output().num_listeners(), 0);

    // The input that hit the limit kept its last state, which the output still reflects
    assert_eq!(inv.state(), !inv.get_input(0).state());
    assert_eq!(inv.output_states(), inv.evaluate());
    assert_eq!(inv.get_input(0).set_state(true), Ok(true));
    assert!(!inv.state());
}

#[test]
fn raw_feedback_loop_is_bounded() {
    let previous = propagation::set_max_changes(8);
    // The observer is registered ahead of the gate, so it sees every change of the input
    let inv = LogicGate::new(Logic::Not, "inv".into());
    let changes = Rc::new(Cell::new(0));
    let c = changes.clone();
    inv.get_input(0).add_listener(move |_| c.set(c.get() + 1));
    inv.initialize().unwrap();

    assert_eq!(
        inv.output().connect(inv.get_input(0)),
        Err(Error::Unsettled {
            pin: "inv.A".into(),
            limit: 8
        })
    );
    assert_eq!(changes.get(), 8);
    assert_eq!(inv.state(), !inv.get_input(0).state());
    propagation::set_max_changes(previous);
}

#[test]
fn unsettled_loop_leaves_upstream_consistent() {
    // A chain feeding a raw self-loop: the chain settles before the loop is abandoned
    let previous = propagation::set_max_changes(16);
    let circuit = buffer_chain(10);
    let xor = LogicGate::build(Logic::Xor, "xor".into()).unwrap();
    circuit.last().unwrap().output().connect(xor.get_input(0)).unwrap();
    xor.output().connect(xor.get_input(1)).unwrap();

    let head = circuit.first().unwrap();
    assert_eq!(
        head.get_input(0).set_state(true),
        Err(Error::Unsettled {
            pin: "xor.Y".into(),
            limit: 16
        })
    );
    assert_settled(&circuit);
    assert!(xor.get_input(0).state());
    // The wire closing the loop still matches the output it copies
    assert_eq!(xor.state(), xor.get_input(1).state());
    propagation::set_max_changes(previous);
}

#[test]
fn raw_feedback_loop_can_settle() {
    let buf = LogicGate::build(Logic::Buf, "buf".into()).unwrap();
    buf.output().connect(buf.get_input(0)).unwrap();
    buf.get_input(0).set_state(true).unwrap();
    assert!(buf.state());
    assert!(buf.get_input(0).state());
}

#[test]
fn latest_driver_wins_at_pin_layer() {
    let a = LogicGate::build(Logic::Buf, "a".into()).unwrap();
    let b = LogicGate::build(Logic::Buf, "b".into()).unwrap();
    let sink = LogicGate::build(Logic::Buf, "sink".into()).unwrap();
    a.output().connect(sink.get_input(0)).unwrap();
    b.output().connect(sink.get_input(0)).unwrap();

    a.get_input(0).set_state(true).unwrap();
    assert!(sink.state());
    b.get_input(0).set_state(true).unwrap();
    b.get_input(0).set_state(false).unwrap();
    assert!(!sink.state());
}

#[test]
fn dropped_gate_stops_listening() {
    let src = LogicGate::build(Logic::Buf, "src".into()).unwrap();
    {
        let sink = LogicGate::build(Logic::Not, "sink".into()).unwrap();
        src.output().connect(sink.get_input(0)).unwrap();
    }
    assert!(src.get_input(0).set_state(true).unwrap());
    assert!(src.output().fan_out().is_empty());
}

fn logic_kind() -> impl Strategy<Value = Logic> {
    let mut kinds = Logic::binary().to_vec();
    kinds.extend([Logic::Buf, Logic::Not]);
    prop::sample::select(kinds)
}

fn reference(kind: &Logic, a: bool, b: bool) -> bool {
    match kind {
        Logic::Buf => a,
        Logic::Not => !a,
        Logic::And => a && b,
        Logic::Or => a || b,
        Logic::Xor => a != b,
        Logic::Nand => !(a && b),
        Logic::Nor => !(a || b),
        Logic::Xnor => a == b,
        _ => unreachable!(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every kind computes its boolean operator, whatever order the inputs arrive in
    #[test]
    fn gate_matches_operator(kind in logic_kind(), a in any::<bool>(), b in any::<bool>(), b_first in any::<bool>()) {
        let g = Gate::build(kind.clone(), "g".into()).unwrap();
        let arity = kind.num_inputs();
        if b_first && arity == 2 {
            g.get_input(1).set_state(b).unwrap();
        }
        g.get_input(0).set_state(a).unwrap();
        if !b_first && arity == 2 {
            g.get_input(1).set_state(b).unwrap();
        }
        let b = if arity == 2 { b } else { false };
        prop_assert_eq!(g.state(), reference(&kind, a, b));
    }

    /// After any stimulus, every gate in a chain agrees with its own inputs
    #[test]
    fn chain_stays_consistent(
        kinds in prop::collection::vec(logic_kind(), 1..12),
        stimulus in prop::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..40),
    ) {
        let circuit = LogicCircuit::new("chain".to_string());
        let gates: Vec<LogicGate> = kinds
            .iter()
            .enumerate()
            .map(|(i, k)| circuit.insert_gate(k.clone(), format_id!("g{i}")).unwrap())
            .collect();
        for pair in gates.windows(2) {
            circuit.connect(pair[0].output(), pair[1].get_input(0)).unwrap();
        }

        // Inputs nothing drives
        let free: Vec<_> = gates
            .iter()
            .flat_map(|g| g.inputs().iter().cloned())
            .filter(|p| circuit.get_driver(p).is_none())
            .collect();

        for (index, value) in stimulus {
            free[index.index(free.len())].set_state(value).unwrap();

            for g in &gates {
                let pins: Vec<bool> = g.inputs().iter().map(|p| p.state()).collect();
                let cached: Vec<bool> = g.cached_inputs().iter().by_vals().collect();
                prop_assert_eq!(&pins, &cached);
                prop_assert_eq!(g.output_states(), g.evaluate());
            }
            for pair in gates.windows(2) {
                prop_assert_eq!(pair[0].state(), pair[1].get_input(0).state());
            }
        }
    }
}
