use cidtree::catalog::{Container, Hierarchy};
use cidtree::tree::{project, project_all, NodeKind};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    println!("🔍 Catalog Probe");
    println!("================");

    let catalog_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("buildtree/tree.json"));

    if !catalog_path.exists() {
        println!("❌ Catalog not found: {}", catalog_path.display());
        println!("Usage: cargo run --bin catalog_probe [catalog.json]");
        return Ok(());
    }

    println!("📁 Loading: {}", catalog_path.display());
    let mut hierarchy = Hierarchy::load(&catalog_path)?;

    // Open every container so the projection shows the whole tree
    let containers: Vec<Container> = project_all(&hierarchy)
        .iter()
        .filter_map(|node| node.id.container())
        .collect();
    for container in containers {
        hierarchy.set_expanded(container, true);
    }

    let rows = project(&hierarchy);
    for row in &rows {
        match row.cid {
            Some(cid) => println!("{}  [{}]", row.display(), cid),
            None => println!("{}", row.display()),
        }
    }

    let count = |kind: NodeKind| rows.iter().filter(|row| row.kind() == kind).count();
    println!();
    println!("📈 Catalog Statistics:");
    println!("  Groups: {}", count(NodeKind::Group));
    println!("  Titles: {}", count(NodeKind::Title));
    println!("  Tabs:   {}", count(NodeKind::Tab));
    println!("  Items:  {}", hierarchy.item_count());

    Ok(())
}
