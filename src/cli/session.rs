use crate::AppContext;
use crate::cart_store::CartStore;
use crate::cli::ui;
use crate::session::{Role, SessionStore, SessionUser};
use anyhow::{Result, bail};
use tracing::info;

pub async fn login(ctx: &AppContext, role: Role, user: &SessionUser, token: &str) -> Result<()> {
    if user.id.trim().is_empty() {
        bail!("User id must not be empty");
    }
    if token.trim().is_empty() {
        bail!("Token must not be empty");
    }

    let sessions = SessionStore::new(ctx.collection("session")?);
    sessions.login(role, user, token).await?;
    info!(%role, user = %user.id, "Signed in");

    let mut message = format!(
        "Signed in as {} ({role})",
        ui::style_text(user.name.as_deref().unwrap_or(&user.id), ui::StyleType::Title)
    );
    if role == Role::User {
        let cart = CartStore::load(ctx.collection("cart")?, None).await;
        let lines = cart.switch_user(Some(&user.id)).await;
        message.push_str(&format!(", cart has {} line(s)", lines.len()));
    }
    println!("{message}");
    Ok(())
}

pub async fn logout(ctx: &AppContext, role: Role) -> Result<()> {
    let sessions = SessionStore::new(ctx.collection("session")?);
    let previous = sessions.user(role).await;
    sessions.logout(role).await;

    match previous {
        Some(user) => {
            if role == Role::User {
                let cart = CartStore::load(ctx.collection("cart")?, Some(&user.id)).await;
                cart.switch_user(None).await;
            }
            println!("Signed out {} ({role})", user.id);
        }
        None => println!(
            "{}",
            ui::style_text(&format!("No {role} session"), ui::StyleType::Subtle)
        ),
    }
    Ok(())
}
