use chat_assistant::db;
use chat_assistant::models::auth::NewAccount;
use chat_assistant::services::authenticator::{default_display_name, hash_password};
use chat_assistant::store::{PgUserStore, StoreError, UserStore};
use dotenvy::dotenv;
use std::io::{self, Write};

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🛡️  Chat Assistant - Create Administrator");
    println!("==========================================");

    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set in .env file")?;
    let admin_email = std::env::var("ADMIN_EMAIL").ok().filter(|e| !e.trim().is_empty());

    let pool = db::connect(&database_url).await?;
    let users = PgUserStore::new(pool.clone());

    let email = match &admin_email {
        Some(default) => {
            let input = prompt(&format!("Email address [{}]: ", default))?;
            if input.is_empty() { default.clone() } else { input }
        }
        None => prompt("Email address: ")?,
    };

    if email.is_empty() || !email.contains('@') {
        eprintln!("❌ Invalid email address");
        return Ok(());
    }

    let display_name = prompt("Display name (optional): ")?;
    let display_name = if display_name.is_empty() { default_display_name(&email) } else { display_name };

    print!("Password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password()?;

    if password.len() < 6 {
        eprintln!("❌ Password must be at least 6 characters long");
        return Ok(());
    }

    print!("Password (again): ");
    io::stdout().flush()?;
    if password != rpassword::read_password()? {
        eprintln!("❌ Passwords don't match");
        return Ok(());
    }

    let password_hash = hash_password(password, bcrypt::DEFAULT_COST).await?;

    match users.insert(NewAccount { email: email.clone(), password_hash, display_name }).await {
        Ok(account) => {
            println!();
            println!("✅ Account created successfully!");
            println!("   ID: {}", account.id);
            println!("   Display name: {}", account.display_name);
            println!("   Email: {}", account.email);
            println!();
            if admin_email.as_deref() == Some(email.as_str()) {
                println!("🌐 This account matches ADMIN_EMAIL and can open /admin");
            } else {
                println!("⚠️  Set ADMIN_EMAIL={} to grant access to /admin", email);
            }
        }
        Err(StoreError::DuplicateEmail) => {
            eprintln!("❌ An account with this email already exists");
        }
        Err(e) => {
            eprintln!("❌ Failed to create account: {}", e);
        }
    }

    pool.close().await;
    Ok(())
}
