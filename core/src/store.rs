//! Named request templates loaded from a collection.
//!
//! # Design
//! `TemplateStore` is built once from a collection document and is read-only
//! afterwards, so it can be shared across threads and resolved from
//! concurrently. Folders are flattened; every request is addressed by its
//! item name, which must be unique. Collection-scoped variables become a
//! fallback environment beneath whatever the caller supplies.

use tracing::debug;

use crate::collection::{Collection, Item, RequestTemplate};
use crate::environment::VariableEnvironment;
use crate::error::ResolveError;
use crate::http::ResolvedRequest;
use crate::resolve::{self, Placeholder};

#[derive(Debug, Clone)]
pub struct TemplateStore {
    name: String,
    templates: Vec<RequestTemplate>,
    defaults: VariableEnvironment,
}

impl TemplateStore {
    /// Parse a Postman v2.1 collection and validate every request in it.
    pub fn from_collection_json(text: &str) -> Result<Self, ResolveError> {
        let collection: Collection =
            serde_json::from_str(text).map_err(|e| ResolveError::Deserialization(e.to_string()))?;
        Self::from_collection(collection)
    }

    pub fn from_collection(collection: Collection) -> Result<Self, ResolveError> {
        let mut templates = Vec::new();
        flatten(collection.item, &mut templates);

        for (i, template) in templates.iter().enumerate() {
            if templates[..i].iter().any(|t| t.name == template.name) {
                return Err(ResolveError::DuplicateTemplate(template.name.clone()));
            }
            template.validate()?;
        }

        let defaults = collection
            .variable
            .iter()
            .filter(|v| !v.disabled)
            .map(|v| (v.key.clone(), v.value_text().unwrap_or_default()))
            .collect();

        debug!(
            collection = %collection.info.name,
            templates = templates.len(),
            "loaded request templates"
        );
        Ok(Self {
            name: collection.info.name,
            templates,
            defaults,
        })
    }

    /// Collection name from its `info` block.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&RequestTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Template names in collection order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Collection-scoped variables used beneath the caller's environment.
    pub fn defaults(&self) -> &VariableEnvironment {
        &self.defaults
    }

    /// Resolve the template called `name`.
    pub fn resolve(
        &self,
        name: &str,
        env: &VariableEnvironment,
    ) -> Result<ResolvedRequest, ResolveError> {
        let template = self.lookup(name)?;
        if self.defaults.is_empty() {
            resolve::resolve(template, env)
        } else {
            resolve::resolve(template, &env.with_fallback(&self.defaults))
        }
    }

    /// Placeholders the template called `name` needs bound.
    pub fn placeholders(&self, name: &str) -> Result<Vec<Placeholder>, ResolveError> {
        resolve::placeholders(self.lookup(name)?)
    }

    fn lookup(&self, name: &str) -> Result<&RequestTemplate, ResolveError> {
        self.get(name)
            .ok_or_else(|| ResolveError::UnknownTemplate(name.to_string()))
    }
}

fn flatten(items: Vec<Item>, out: &mut Vec<RequestTemplate>) {
    for item in items {
        if let Some(mut request) = item.request {
            request.name = item.name;
            out.push(request);
        } else if let Some(children) = item.item {
            flatten(children, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(items: serde_json::Value, variables: serde_json::Value) -> String {
        json!({
            "info": {"name": "Payments", "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"},
            "item": items,
            "variable": variables,
        })
        .to_string()
    }

    fn request(method: &str, url: &str) -> serde_json::Value {
        json!({"method": method, "url": url})
    }

    #[test]
    fn nested_folders_are_flattened_in_order() {
        let text = collection(
            json!([
                {"name": "Payments", "item": [
                    {"name": "Payments - Create", "request": request("POST", "{{baseUrl}}/payments")},
                    {"name": "Payments - Update", "request": request("POST", "{{baseUrl}}/payments/:id")}
                ]},
                {"name": "Refunds - Retrieve", "request": request("GET", "{{baseUrl}}/refunds/:id")}
            ]),
            json!([]),
        );
        let store = TemplateStore::from_collection_json(&text).unwrap();
        assert_eq!(store.name(), "Payments");
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.names().collect::<Vec<_>>(),
            vec!["Payments - Create", "Payments - Update", "Refunds - Retrieve"]
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let text = collection(
            json!([
                {"name": "Same", "request": request("GET", "a")},
                {"name": "Same", "request": request("GET", "b")}
            ]),
            json!([]),
        );
        assert_eq!(
            TemplateStore::from_collection_json(&text).unwrap_err(),
            ResolveError::DuplicateTemplate("Same".to_string())
        );
    }

    #[test]
    fn malformed_request_fails_the_load() {
        let text = collection(json!([{"name": "Bad", "request": request("", "a")}]), json!([]));
        assert!(matches!(
            TemplateStore::from_collection_json(&text),
            Err(ResolveError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn unknown_template_is_reported() {
        let store = TemplateStore::from_collection_json(&collection(json!([]), json!([]))).unwrap();
        assert!(store.is_empty());
        assert_eq!(
            store.resolve("Payments - Void", &VariableEnvironment::new()).unwrap_err(),
            ResolveError::UnknownTemplate("Payments - Void".to_string())
        );
    }

    #[test]
    fn collection_variables_sit_beneath_the_environment() {
        let text = collection(
            json!([{"name": "Retrieve", "request": request("GET", "{{baseUrl}}/payments/{{payment_id}}")}]),
            json!([
                {"key": "baseUrl", "value": "https://sandbox.hyperswitch.io"},
                {"key": "payment_id", "value": "pay_default"}
            ]),
        );
        let store = TemplateStore::from_collection_json(&text).unwrap();

        let req = store.resolve("Retrieve", &VariableEnvironment::new()).unwrap();
        assert_eq!(req.url, "https://sandbox.hyperswitch.io/payments/pay_default");

        let env = VariableEnvironment::new().with("payment_id", "pay_mine");
        let req = store.resolve("Retrieve", &env).unwrap();
        assert_eq!(req.url, "https://sandbox.hyperswitch.io/payments/pay_mine");
    }

    #[test]
    fn collection_variable_tokens_resolve_against_the_environment() {
        let text = collection(
            json!([{"name": "R", "request": request("GET", "{{baseUrl}}/payments")}]),
            json!([{"key": "baseUrl", "value": "https://{{host}}"}]),
        );
        let store = TemplateStore::from_collection_json(&text).unwrap();

        let env = VariableEnvironment::new().with("host", "sandbox.hyperswitch.io");
        let req = store.resolve("R", &env).unwrap();
        assert_eq!(req.url, "https://sandbox.hyperswitch.io/payments");

        assert_eq!(
            store.resolve("R", &VariableEnvironment::new()).unwrap_err(),
            ResolveError::unresolved("host", crate::error::TokenLocation::Url)
        );
    }

    #[test]
    fn garbage_is_a_deserialization_error() {
        assert!(matches!(
            TemplateStore::from_collection_json("{"),
            Err(ResolveError::Deserialization(_))
        ));
    }

    #[test]
    fn store_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TemplateStore>();
    }
}
