//! Frame Model Example - Simple Portal Frame

use anyhow::Result;
use frame_model::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Frame Model Example: Portal Frame ===\n");

    let mut model = Model::new();

    let column = model.add_section("R30x30", Section::square(0.3))?;
    let beam = model.add_section("T40", Section::t(0.6, 0.12, 0.25, 0.4))?;
    let concrete = model.add_material("C30", Material::concrete(30e6))?;
    let fixed = model.add_support("Fixed", Support::fixed())?;
    let hinge = model.add_release("Hinge", Release::pin_both())?;

    // Create a simple portal frame
    //
    //     N2 -------- N3
    //     |           |
    //     |           |
    //     N0          N1
    //    ///         ///
    let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).with_support(fixed))?;
    let n1 = model.add_node(Node::new(6.0, 0.0, 0.0).with_support(fixed))?;
    let n2 = model.add_node(Node::anchored(n0, 0.0, 0.0, 4.0))?;
    let n3 = model.add_node(Node::anchored(n1, 0.0, 0.0, 4.0))?;

    model.add_bar(Bar::new(n0, n2, column, concrete))?;
    model.add_bar(Bar::new(n1, n3, column, concrete))?;
    let girder = model.add_bar(Bar::new(n2, n3, beam, concrete).with_release(hinge))?;
    let midspan = model.add_interior_node(girder, 0.5)?;

    println!("Model:");
    for (kind, count) in model.counts() {
        println!("  {kind}s: {count}");
    }

    println!("\nNode positions:");
    for node in model.nodes() {
        let p = model.position(node.id())?;
        println!("  N{}: ({:.3}, {:.3}, {:.3})", node.id(), p.x, p.y, p.z);
    }

    let mut loads = LoadTable::new();
    loads.add_node_load(midspan);
    loads.add_bar_load(girder);

    let deps = model.dependents_with_loads(&Seeds::new().release(hinge), &loads)?;
    println!("\nDepending on release 'Hinge': {}", deps.describe());
    println!("  loads: {:?}", deps.loads);

    // Raising the left base moves both left-hand nodes
    model.change_position(n0, 0.0, 0.0, 0.5)?;
    let p = model.position(n2)?;
    println!("\nAfter raising N0, N2 sits at z = {:.3}", p.z);

    let report = model.check_structure()?;
    if report.is_valid() {
        println!("\nStructure check passed ({} block)", report.components.len());
    } else {
        println!("\nStructure check failed: {}", report.describe());
    }

    match model.delete_section(column, false) {
        Ok(_) => println!("\nSection 'R30x30' deleted"),
        Err(e) => println!("\nCannot delete section: {e}"),
    }

    Ok(())
}
