use doflow::store::TaskStore;

#[tokio::main]
async fn main() {
    systemd_journal_logger::JournalLog::new()
        .unwrap()
        .with_syslog_identifier("doflow-store-check".to_string())
        .install()
        .unwrap();
    if std::env::var("DOFLOW_DEBUG").is_ok_and(|v| v == "1") {
        doflow::set_debug_logging(true);
    }
    log::set_max_level(if doflow::debug_logging() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    // Load config
    let config = match doflow::config::DoflowConfig::load() {
        Some(c) => c,
        None => {
            println!("No backend configured.");
            match doflow::config::config_path() {
                Some(path) => println!(
                    "Set DOFLOW_URL and DOFLOW_ANON_KEY, or write {}",
                    path.display()
                ),
                None => println!("Set DOFLOW_URL and DOFLOW_ANON_KEY."),
            }
            return;
        }
    };

    println!("=== Task Store Health ===\n");
    println!("--- Backend: {} ---", config.url);

    let auth = match doflow::auth::AuthClient::new(&config.url, &config.anon_key) {
        Ok(c) => c,
        Err(e) => {
            println!("  Auth client error: {}", e);
            return;
        }
    };

    // Stored session first, env credentials as the fallback
    let session = match auth.session().await {
        Ok(Some(session)) => session,
        Ok(None) => {
            let email = std::env::var("DOFLOW_EMAIL").unwrap_or_default();
            let password = std::env::var("DOFLOW_PASSWORD").unwrap_or_default();
            if email.is_empty() || password.is_empty() {
                println!("  No stored session. Set DOFLOW_EMAIL and DOFLOW_PASSWORD to sign in.");
                return;
            }
            match auth.sign_in(&email, &password).await {
                Ok(session) => session,
                Err(e) => {
                    println!("  Sign-in failed: {}", e);
                    return;
                }
            }
        }
        Err(e) => {
            println!("  Session error: {}", e);
            return;
        }
    };
    println!("  Signed in as {}", session.user.email);

    let store = match doflow::store::supabase::SupabaseStore::new(
        &config.url,
        &config.anon_key,
        &session.access_token,
    ) {
        Ok(s) => s,
        Err(e) => {
            println!("  Store client error: {}", e);
            return;
        }
    };

    let rows = match store.select_all().await {
        Ok(rows) => rows,
        Err(e) => {
            println!("  Error fetching rows: {}", e);
            println!("  An empty or partial result usually means a row-level security policy.");
            return;
        }
    };

    println!("  Rows: {}\n", rows.len());

    // Tallies over the raw rows, before normalization papers over oddities
    let mut work = 0;
    let mut life = 0;
    let mut other = 0;
    let mut done = 0;
    let mut unmapped: Vec<(String, String)> = Vec::new();
    for row in &rows {
        match row.category.as_deref() {
            Some("work") => work += 1,
            Some("life") => life += 1,
            raw => {
                other += 1;
                unmapped.push((row.title.clone(), raw.unwrap_or("<null>").to_string()));
            }
        }
        if row.is_done.unwrap_or(false) {
            done += 1;
        }
    }
    println!(
        "  work: {}  life: {}  other: {}  done: {}",
        work, life, other, done
    );

    // Order-key health
    let missing = rows.iter().filter(|r| r.order_index.is_none()).count();
    let mut keys: Vec<i64> = rows.iter().filter_map(|r| r.order_index).collect();
    let sorted_on_arrival = keys.windows(2).all(|w| w[0] <= w[1]);
    keys.sort();
    let duplicates = keys.windows(2).filter(|w| w[0] == w[1]).count();
    let max_gap = keys.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0);

    println!("\n  ORDER KEYS:");
    println!("    missing: {}", missing);
    println!("    duplicates: {}", duplicates);
    println!("    largest gap: {}", max_gap);
    if !sorted_on_arrival {
        println!("    WARNING: rows did not arrive in ascending key order");
    }

    if !unmapped.is_empty() {
        println!("\n  UNMAPPED CATEGORIES ({}):", unmapped.len());
        for (title, raw) in &unmapped {
            println!("    [{}] {}", raw, title);
        }
    }

    println!("\n=== Done ===");
}
