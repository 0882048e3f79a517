use super::Project;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use cpp_delegate_catalog::{
    search_catalog, AttributeDescriptor, AttributeKind, BinaryLayout, CatalogSection,
    FunctionDescriptor,
};

pub fn show(project: &Project, json: bool) -> Result<()> {
    let catalog = &project.catalog;
    if json {
        return ui::print_json(&catalog.list_descriptors());
    }

    let namespace = if catalog.namespace().is_empty() {
        "(top level)"
    } else {
        catalog.namespace()
    };
    println!("{} {}", "Namespace:".bold(), namespace.cyan());

    ui::print_section("Attributes");
    println!(
        "  {:<24} {:<24} {:<14} {}",
        "Name".bold(),
        "Type".bold(),
        "Shape".bold(),
        "Wire".bold()
    );
    for name in catalog.sorted_attribute_names() {
        let attr = &catalog.attributes()[name];
        let wire = match project.codec.attribute_layout(attr) {
            Ok(layout) => describe_layout(&layout).yellow(),
            Err(_) => "unsupported".red(),
        };
        println!(
            "  {:<24} {:<24} {:<14} {}",
            attr.name.green(),
            declared_type(attr),
            shape(attr.kind),
            wire
        );
    }

    ui::print_section("Functions");
    println!(
        "  {:>6}  {:<24} {}",
        "Opcode".bold(),
        "Name".bold(),
        "Signature".bold()
    );
    let table = catalog.functions();
    for (opcode, function) in table.iter() {
        let symbol = table.symbol(opcode).unwrap_or_default();
        println!(
            "  {:>6}  {:<24} {}",
            opcode.to_string().cyan(),
            symbol.green(),
            signature(function)
        );
    }

    println!();
    ui::print_info(&format!(
        "{} attributes, {} functions",
        catalog.attributes().len(),
        catalog.functions().len()
    ));
    Ok(())
}

pub fn search(project: &Project, query: &str, json: bool) -> Result<()> {
    let results = search_catalog(&project.catalog, query);
    if json {
        return ui::print_json(&results);
    }
    if results.is_empty() {
        ui::print_warning(&format!("Nothing matches '{}'", query));
        return Ok(());
    }

    for result in &results {
        let detail = match result.section {
            CatalogSection::Attribute => project
                .catalog
                .attribute(&result.name)
                .map(declared_type)
                .unwrap_or_default(),
            CatalogSection::Function => project
                .catalog
                .function(&result.name)
                .map(|(opcode, f)| format!("#{} {}", opcode, signature(f)))
                .unwrap_or_default(),
        };
        let section = match result.section {
            CatalogSection::Attribute => "attribute",
            CatalogSection::Function => "function",
        };
        println!(
            "  {:<10} {:<24} {}",
            section.dimmed(),
            result.name.green(),
            detail
        );
    }
    Ok(())
}

fn declared_type(attr: &AttributeDescriptor) -> String {
    let mut text = String::new();
    if attr.is_const {
        text.push_str("const ");
    }
    if attr.is_volatile {
        text.push_str("volatile ");
    }
    text.push_str(&attr.type_name);
    text
}

fn shape(kind: AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Scalar => "scalar",
        AttributeKind::FixedArray => "fixed array",
        AttributeKind::DynamicArray => "dynamic array",
    }
}

fn describe_layout(layout: &BinaryLayout) -> String {
    match *layout {
        BinaryLayout::Scalar { element } => element.to_string(),
        BinaryLayout::FixedArray { element, length } => format!("[{}; {}]", element, length),
        BinaryLayout::DynamicArray { element } => format!("view<{}>", element),
    }
}

fn signature(function: &FunctionDescriptor) -> String {
    let args: Vec<String> = function
        .arguments
        .iter()
        .map(|arg| format!("{} {}", arg.type_name, arg.name))
        .collect();
    format!(
        "{} {}({})",
        function.result_type.as_deref().unwrap_or("void"),
        function.name,
        args.join(", ")
    )
}
