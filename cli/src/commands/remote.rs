use super::Project;
use crate::ui;
use anyhow::{Context, Result};
use colored::Colorize;
use cpp_delegate_catalog::{AttributeKind, CallResult, FunctionPlan, Scalar, Value};
use cpp_delegate_sdk::{CancellationToken, RemoteContext, StreamChannel};
use std::future::Future;
use tokio::net::TcpStream;

type TcpContext = RemoteContext<StreamChannel<TcpStream>>;

pub fn get(project: &Project, connect: Option<String>, name: &str) -> Result<()> {
    // Fail on unknown names before touching the network.
    project.catalog.attribute(name)?;
    run_connected(project, connect, |mut ctx| async move {
        let value = ctx.get(name).await?;
        println!("{} = {}", name.green(), value.to_string().cyan());
        Ok(())
    })
}

pub fn set(project: &Project, connect: Option<String>, name: &str, values: &[String]) -> Result<()> {
    let value = parse_attribute_value(project, name, values)?;
    run_connected(project, connect, |mut ctx| async move {
        ctx.set(name, value.clone()).await?;
        ui::print_success(&format!("{} = {}", name, value));
        Ok(())
    })
}

pub fn call(project: &Project, connect: Option<String>, name: &str, args: &[String]) -> Result<()> {
    let args = parse_arguments(project, name, args)?;
    run_connected(project, connect, |mut ctx| async move {
        match ctx.call(name, &args).await? {
            CallResult::Scalar(result) => println!("{}", result.to_string().cyan()),
            CallResult::Raw(bytes) if bytes.is_empty() => ui::print_success(&format!("{} returned", name)),
            CallResult::Raw(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                println!("{}", hex.join(" ").yellow());
            }
        }
        Ok(())
    })
}

fn parse_attribute_value(project: &Project, name: &str, values: &[String]) -> Result<Value> {
    let attr = project.catalog.attribute(name)?;
    let element = project.codec.attribute_layout(attr)?.element();
    let scalars = values
        .iter()
        .map(|text| Scalar::parse(text, element))
        .collect::<Result<Vec<_>, _>>()?;
    match (attr.kind, scalars.as_slice()) {
        (AttributeKind::Scalar, [single]) => Ok(Value::Scalar(*single)),
        _ => Ok(Value::Array(scalars)),
    }
}

fn parse_arguments(project: &Project, name: &str, args: &[String]) -> Result<Vec<Scalar>> {
    let (opcode, function) = project.catalog.function(name)?;
    let plan = FunctionPlan::build(opcode, function, &project.codec)?;
    if plan.fields.len() != args.len() {
        anyhow::bail!(
            "{} takes {} argument(s), got {}",
            name,
            plan.fields.len(),
            args.len()
        );
    }
    plan.fields
        .iter()
        .zip(args)
        .map(|(field, text)| {
            Scalar::parse(text, field.scalar)
                .with_context(|| format!("Invalid value for argument '{}'", field.name))
        })
        .collect()
}

/// Connect to the bridge, build a context and run `action` on it. Ctrl-C
/// cancels whatever round trip is in flight.
fn run_connected<F, Fut>(project: &Project, connect: Option<String>, action: F) -> Result<()>
where
    F: FnOnce(TcpContext) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let address = connect
        .or_else(|| project.config.connection.address.clone())
        .context("No device address given. Pass --connect or set connection.address")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        ui::print_step(&format!("Connecting to {}", address));
        let stream = TcpStream::connect(&address)
            .await
            .with_context(|| format!("Failed to connect to {}", address))?;
        let config = project.config.context_config().with_cancellation(cancel);
        let ctx = RemoteContext::connect(StreamChannel::new(stream), &project.ast, config).await?;
        tracing::debug!(attributes = ctx.addresses().len(), "Resolved remote addresses");
        action(ctx).await
    })
}
