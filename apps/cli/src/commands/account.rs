//! Account commands: sign in and out, and the profile of the signed-in user.

use serde_json::{Map, Value};

use codemart_core::{Registration, User};

use crate::cli::{LoginArgs, ProfileArgs, RegisterArgs};
use crate::error::CliResult;
use crate::AppContext;

pub async fn login(ctx: &AppContext, args: LoginArgs) -> CliResult<String> {
    let user = ctx.session.login(&args.email, args.password.as_deref()).await?;
    Ok(format!("Signed in as {}", describe(&user)))
}

pub async fn register(ctx: &AppContext, args: RegisterArgs) -> CliResult<String> {
    let registration = Registration {
        username: args.username,
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
    };
    let user = ctx.session.register(&registration).await?;
    Ok(format!("Account created. Signed in as {}", describe(&user)))
}

pub async fn logout(ctx: &AppContext) -> CliResult<String> {
    ctx.session.logout().await;
    Ok("Signed out".to_string())
}

pub async fn whoami(ctx: &AppContext) -> CliResult<String> {
    Ok(match ctx.session.current_user().await {
        Some(user) => describe(&user),
        None => "Not signed in".to_string(),
    })
}

/// Pushes `key=value` fields. Values that parse as JSON (numbers, booleans)
/// are sent typed, everything else as a string.
pub async fn profile(ctx: &AppContext, args: ProfileArgs) -> CliResult<String> {
    let patch: Map<String, Value> = args
        .fields
        .into_iter()
        .map(|(key, raw)| {
            let value = match serde_json::from_str::<Value>(&raw) {
                Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
                _ => Value::String(raw),
            };
            (key, value)
        })
        .collect();

    let user = ctx.session.update_user_profile(&patch).await?;
    Ok(format!("Profile updated for {}", describe(&user)))
}

fn describe(user: &User) -> String {
    format!("{} <{}> (id {})", user.display_name(), user.email, user.id)
}
