use std::collections::HashMap;

/// Hands out `"{name}-{n}"` ids with one counter per name, starting at 1.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counters: HashMap<String, usize>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_id(&mut self, name: &str) -> String {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        format!("{name}-{counter}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_name() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.generate_id("schema"), "schema-1");
        assert_eq!(ids.generate_id("schema"), "schema-2");
        assert_eq!(ids.generate_id("endpoint"), "endpoint-1");
        assert_eq!(ids.generate_id("schema"), "schema-3");
        assert_eq!(ids.generate_id("requestBody"), "requestBody-1");
    }

    #[test]
    fn test_independent_generators() {
        let mut first = IdGenerator::new();
        let mut second = IdGenerator::new();
        first.generate_id("path");
        assert_eq!(second.generate_id("path"), "path-1");
    }
}
