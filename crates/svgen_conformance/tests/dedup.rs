//! Merging of structurally equivalent modules across a hierarchy.

use svgen_conformance::{run_pipeline, ModelBuilder};
use svgen_config::EmitConfig;
use svgen_module::{Design, ModuleId, ObjectId, PortDirection, VarRef, VarSpec};

const SRC: &str = "SC_MODULE(Top) {\n  Mid m0;\n  Mid m1;\n};\n";

/// `Leaf`: `dout := din`; `wide` widens `din` to 16 bits.
fn leaf(design: &mut Design, obj: ObjectId, wide: bool) -> ModuleId {
    let id = design.create_module(obj, "Leaf", "");
    let (_, m) = design.parts_mut(id).unwrap();
    let din = m.create_auxiliary_port(PortDirection::In, VarSpec::new("din", if wide { 16 } else { 8 }));
    let dout = m.create_auxiliary_port(PortDirection::Out, VarSpec::new("dout", 8));
    m.add_assignment(VarRef::scalar(dout), VarRef::scalar(din)).unwrap();
    id
}

/// `Mid`: one `din` port forwarded into a `Leaf` instance.
fn mid(design: &mut Design, obj: ObjectId, leaf_obj: ObjectId, leaf_id: ModuleId) -> ModuleId {
    let id = design.create_module(obj, "Mid", "");
    let (_, m) = design.parts_mut(id).unwrap();
    let din = m.create_auxiliary_port(PortDirection::In, VarSpec::new("din", 8));
    let inst = m.add_module_instance(leaf_id, leaf_obj, "u_leaf");
    m.add_binding(inst, "din", &VarRef::scalar(din)).unwrap();
    m.add_bind_var(din);
    id
}

struct Hierarchy {
    design: Design,
    leaves: [ModuleId; 2],
    mids: [ModuleId; 2],
}

fn hierarchy(second_leaf_wide: bool) -> Hierarchy {
    let mut b = ModelBuilder::new("/work/rtl/top.cpp", SRC);
    let top = b.top_module("Top", "Top");
    let m0 = b.child_module(top, "Mid");
    let m1 = b.child_module(top, "Mid");
    let l0 = b.child_module(m0, "Leaf");
    let l1 = b.child_module(m1, "Leaf");
    let mut design = b.into_design(EmitConfig::default());

    let top_id = design.create_module(top, "Top", "");
    let leaf0 = leaf(&mut design, l0, false);
    let leaf1 = leaf(&mut design, l1, second_leaf_wide);
    let mid0 = mid(&mut design, m0, l0, leaf0);
    let mid1 = mid(&mut design, m1, l1, leaf1);

    let (_, t) = design.parts_mut(top_id).unwrap();
    let bus = t.create_auxiliary_signal(VarSpec::new("bus", 8));
    for (child, obj, name) in [(mid0, m0, "u_m0"), (mid1, m1, "u_m1")] {
        let inst = t.add_module_instance(child, obj, name);
        t.add_binding(inst, "din", &VarRef::scalar(bus)).unwrap();
    }
    t.add_bind_var(bus);

    Hierarchy {
        design,
        leaves: [leaf0, leaf1],
        mids: [mid0, mid1],
    }
}

#[test]
fn parents_merge_once_their_children_have() {
    let mut h = hierarchy(false);
    let result = run_pipeline(&mut h.design).unwrap();
    assert_eq!(result.merged, 2);
    assert_eq!(h.design.canonical(h.leaves[1]), h.leaves[0]);
    assert_eq!(h.design.canonical(h.mids[1]), h.mids[0]);

    let text = &result.text;
    assert_eq!(text.matches("endmodule").count(), 3);
    assert_eq!(text.matches("\nmodule Leaf ").count(), 1);
    assert_eq!(text.matches("\nmodule Mid ").count(), 1);
    assert!(!text.contains("Leaf0"));
    assert!(!text.contains("Mid0"));
    assert!(text.contains("Mid u_m0\n(\n  .din(bus)\n);\n\n"));
    assert!(text.contains("Mid u_m1\n(\n  .din(bus)\n);\n\n"));
    assert!(text.contains("Leaf u_leaf\n(\n  .din(din)\n);\n\n"));
}

#[test]
fn differing_leaves_keep_both_branches() {
    let mut h = hierarchy(true);
    let result = run_pipeline(&mut h.design).unwrap();
    assert_eq!(result.merged, 0);
    assert!(!h.design.is_duplicate(h.mids[1]));
    assert_eq!(result.text.matches("endmodule").count(), 5);
    assert!(result.text.contains("\nmodule Leaf0 "));
    assert!(result.text.contains("Leaf0 u_leaf\n"));
    assert!(result.text.contains("Mid0 u_m1\n"));
}

#[test]
fn equivalence_is_symmetric_and_sensitive_to_assignments() {
    let mut h = hierarchy(false);
    run_pipeline(&mut h.design).unwrap();
    let objects = h.design.objects();
    let a = h.design.module(h.leaves[0]).unwrap();
    let b = h.design.module(h.leaves[1]).unwrap();
    assert!(a.is_equivalent_to(b, objects, |id| id).unwrap());
    assert!(b.is_equivalent_to(a, objects, |id| id).unwrap());
    assert_eq!(
        a.fingerprint(objects, |id| id).unwrap(),
        b.fingerprint(objects, |id| id).unwrap()
    );

    let mids = [h.design.module(h.mids[0]).unwrap(), h.design.module(h.mids[1]).unwrap()];
    assert!(!mids[0].is_equivalent_to(mids[1], objects, |id| id).unwrap());
    assert!(mids[0]
        .is_equivalent_to(mids[1], objects, |id| h.design.canonical(id))
        .unwrap());
}
