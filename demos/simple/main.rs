use toggle_engine::{ClientConfig, Context, Event, Snapshot};

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("toggle_engine=debug"))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/data/features.json".to_owned());
    let json = std::fs::read_to_string(&path).unwrap();

    let client = ClientConfig::new()
        .event_listener(|event: Event| {
            if let Event::Impression(impression) = event {
                println!("Impression: {:?}", impression);
            }
        })
        .to_client()
        .unwrap();

    // Fetching definitions is up to the application. Publish whatever was loaded.
    client.store().set_snapshot(Snapshot::from_json(&json).unwrap());

    let context = Context {
        user_id: Some("tester".into()),
        environment: Some("production".into()),
        ..Context::default()
    }
    .with_property("region", "eu-west")
    .with_property("appVersion", "1.5.0");

    for feature in client.feature_toggle_definitions() {
        let enabled = client.is_enabled(&feature.name, &context, || false);
        let variant = client.get_variant(&feature.name, &context, None);
        println!("{}: enabled={} variant={}", feature.name, enabled, variant.name);
    }
}
