use std::path::Path;

use grammers_client::{Client, Config as ClientConfig, InitParams, SignInError};
use grammers_session::Session;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tracing::info;

use tes_core::{config::Config, errors::Error, Result};

/// Connect and make sure the account is authorized.
///
/// With `session_file` set, an existing session is reused and the (possibly new)
/// session is written back; without it the session lives in memory only.
pub async fn connect_and_sign_in(
    cfg: &Config,
    app_id: i32,
    app_hash: &str,
    session_file: Option<&Path>,
) -> Result<Client> {
    let session = match session_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            Session::load_file_or_create(path)?
        }
        None => Session::new(),
    };

    let client = Client::connect(ClientConfig {
        session,
        api_id: app_id,
        api_hash: app_hash.to_string(),
        params: InitParams {
            device_model: cfg.device_model.clone(),
            system_version: cfg.system_version.clone(),
            app_version: cfg.app_version.clone(),
            lang_code: cfg.lang_code.clone(),
            catch_up: false,
            ..Default::default()
        },
    })
    .await
    .map_err(|e| Error::External(format!("telegram connect error: {e}")))?;

    let authorized = client
        .is_authorized()
        .await
        .map_err(|e| Error::Auth(format!("authorization check failed: {e}")))?;

    if !authorized {
        let mut input = BufReader::new(tokio::io::stdin());

        let phone = match &cfg.phone {
            Some(p) => p.clone(),
            None => ask(&mut input, "Enter your phone number (international format): ").await?,
        };
        let token = client
            .request_login_code(&phone)
            .await
            .map_err(|e| Error::Auth(format!("cannot request login code: {e}")))?;

        let code = ask(&mut input, "Enter the code you received: ").await?;
        match client.sign_in(&token, &code).await {
            Ok(_) => {}
            Err(SignInError::PasswordRequired(password_token)) => {
                let hint = password_token.hint().unwrap_or("none").to_string();
                let prompt = format!("Enter the 2FA password (hint: {hint}): ");
                let password = ask(&mut input, &prompt).await?;
                client
                    .check_password(password_token, password.trim())
                    .await
                    .map_err(|e| Error::Auth(e.to_string()))?;
            }
            Err(e) => return Err(Error::Auth(e.to_string())),
        }
    }

    if let Some(path) = session_file {
        client.session().save_to_file(path)?;
    }

    let me = client
        .get_me()
        .await
        .map_err(|e| Error::Auth(format!("cannot fetch signed-in user: {e}")))?;
    info!(
        user_id = me.id(),
        username = me.username().unwrap_or(""),
        "signed in"
    );

    Ok(client)
}

async fn ask(input: &mut BufReader<Stdin>, prompt: &str) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Err(Error::Auth("stdin closed before sign-in finished".to_string()));
    }
    Ok(line.trim().to_string())
}
