use lightswitch_lib::domain::models::AppError;

fn parse_target(arg: Option<String>) -> Result<Option<bool>, AppError> {
    match arg.as_deref() {
        None => Ok(None),
        Some("on") => Ok(Some(true)),
        Some("off") => Ok(Some(false)),
        Some(other) => Err(AppError::new(
            "INVALID_ARGUMENT",
            format!("unknown target state `{other}`"),
            Some("usage: lightswitch [on|off]".to_string()),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let target = parse_target(std::env::args().nth(1))?;
    let controller = lightswitch_lib::run().await?;
    if let Some(on) = target {
        let run = controller.synchronizer().apply_state(on).await;
        for failure in &run.failed {
            eprintln!("light {}: {}", failure.light_id, failure.reason);
        }
    }
    println!("{}", controller.label());
    Ok(())
}
