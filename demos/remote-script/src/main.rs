//! Calls `test` through a dispatcher.
//!
//! Start `exec-server` first, then run with:
//!
//! ```text
//! USE_REMOTE_EXEC=true cargo run -p remote-script
//! ```
//!
//! Without `USE_REMOTE_EXEC` the local closure runs instead.

use remote_exec_client::{Definition, Dispatcher, DispatcherConfig, HelperRegistry};
use serde_json::{Map, Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELLO_WORLD: &str = r"
    @remote_func
    function hello_world() {
        console.log('Hello, world!');
        return 42;
    }
";

const TEST: &str = r"
    @remote
    function test() {
        console.log('Running test');
        hello_world();
        return 123;
    }
";

fn hello_world() -> i64 {
    println!("Hello, world!");
    42
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let helpers = HelperRegistry::new();
    helpers.register(Definition::inline("hello_world", HELLO_WORLD));

    let dispatcher: Dispatcher = Dispatcher::builder(
        Definition::inline("test", TEST),
        |_: &[Value], _: &Map<String, Value>| {
            println!("Running test");
            hello_world();
            Ok(json!(123))
        },
    )
    .helpers(&helpers)
    .config(DispatcherConfig::default().endpoint("http://127.0.0.1:5005/exec"))
    .build()?;

    let value = dispatcher.call(Vec::new(), Map::new()).await?;
    println!("Returned: {value}");
    Ok(())
}
