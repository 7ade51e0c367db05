use crate::commands::Out;
use crate::model::Customer;
use crate::Config;
use crate::Result;

/// Lists the configured customers. The first one is selected when a session starts.
pub async fn customers(config: Config) -> Result<Out<Vec<Customer>>> {
    let customers: Vec<Customer> = config.customers().iter().cloned().collect();
    let lines: Vec<String> = customers
        .iter()
        .map(|c| {
            format!(
                "{}: {} - {}{}",
                c.id(),
                c.display_name(),
                c.subject_line(),
                if c.gst_exempt() { " (no GST)" } else { "" }
            )
        })
        .collect();
    Ok(Out::new(lines.join("\n"), customers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_customers_lists_defaults() {
        let env = TestEnv::new().await;
        let out = customers(env.config()).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 2);
        assert!(out
            .message()
            .contains("1: Quest Frankston on the Bay - Chargeback from PAD Thai Food"));
        assert!(out.message().contains("2: MEEKHUN PTY LTD - Rent (no GST)"));
    }
}
