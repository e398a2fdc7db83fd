use serde_json::{Map, Value, json};

use crate::config::{Effective, HelloWorldArgs};
use crate::env::{self, Env};
use crate::error::CliError;

pub const SCHEMA: &str = "hello-world";

pub fn payload() -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("hello".into(), json!("world"));
    data.insert("answer".into(), json!(42));
    data
}

pub async fn run(args: HelloWorldArgs, eff: &Effective) -> Result<(), CliError> {
    let env = Env::require(&[env::REPORTING])?;
    let client = super::reporting_client(&env, eff)?;
    client.put(&args.topic, SCHEMA, &payload()).await?;
    tracing::info!(topic = %args.topic, session = %client.session(), "hello-world sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape() {
        assert_eq!(Value::Object(payload()), json!({"hello": "world", "answer": 42}));
    }
}
