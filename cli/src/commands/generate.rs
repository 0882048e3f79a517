use super::Project;
use crate::ui;
use anyhow::{Context, Result};
use cpp_delegate_catalog::LayoutPlan;
use cpp_delegate_codegen::{compile_host, compile_remote, write_host, write_remote};
use std::path::PathBuf;

fn plan(project: &Project) -> Result<LayoutPlan> {
    LayoutPlan::build(&project.ast, &project.catalog, &project.codec)
        .context("Failed to plan the remote layout")
}

pub fn remote(project: &Project, output: Option<PathBuf>) -> Result<()> {
    let dir = output.unwrap_or_else(|| project.config.remote.output_dir.clone());
    let plan = plan(project)?;
    ui::print_step(&format!(
        "Generating remote headers for {} functions",
        plan.functions.len()
    ));

    let headers = compile_remote(&plan, &project.config.remote_config());
    write_remote(&headers, &dir)
        .with_context(|| format!("Failed to write headers to {}", dir.display()))?;

    ui::print_success(&format!("Wrote AddressOf.h and MemberHeader.h to {}", dir.display()));
    for header in &plan.headers {
        ui::print_info(&format!("includes {}", header));
    }
    Ok(())
}

pub fn host(project: &Project, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| project.config.host.output.clone());
    let plan = plan(project)?;
    ui::print_step(&format!(
        "Generating host bindings for {} functions",
        plan.functions.len()
    ));

    let unsupported: Vec<&str> = plan
        .functions
        .iter()
        .filter(|f| f.result.as_ref().is_some_and(|r| r.scalar.is_none()))
        .map(|f| f.name.as_str())
        .collect();
    if !unsupported.is_empty() {
        ui::print_warning(&format!(
            "Raw byte results for: {}",
            unsupported.join(", ")
        ));
    }

    let bindings = compile_host(&plan, &project.config.host_config());
    write_host(&bindings, &path)
        .with_context(|| format!("Failed to write bindings to {}", path.display()))?;

    ui::print_success(&format!("Wrote {}", path.display()));
    Ok(())
}
