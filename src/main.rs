use opendiary_portal::{AssignmentStore, Portal, PortalConfig};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PortalConfig::from_env()?;
    log::info!("Starting OpenDiary portal (login at {})", config.login_path);
    let portal = Portal::boot(config, AssignmentStore::new())?;

    let session = portal.session();
    let report = match session.current() {
        Some(identity) => json!({
            "authenticated": true,
            "identity": identity,
            "landing": identity.role().landing_path(),
            "assignments": portal.my_assignments(),
        }),
        None => json!({
            "authenticated": false,
            "pendingRedirect": session.pending_redirect(),
            "login": session.login_path(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
