//! Typed tool descriptors.
//!
//! A tool declares its inputs as a list of [`ParamSpec`]s instead of a loose
//! JSON map. Descriptors are checked once when a tool is registered, and
//! rendered to JSON Schema for the model.

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Semantic type of a tool parameter or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// JSON Schema type keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Smallest value of this type, used to probe argument decoding.
    fn sample(&self, items: Option<ParamType>) -> Value {
        match self {
            ParamType::String => json!(""),
            ParamType::Integer => json!(0),
            ParamType::Number => json!(0.0),
            ParamType::Boolean => json!(false),
            ParamType::Array => match items {
                Some(item) => Value::Array(vec![item.sample(None)]),
                None => json!([]),
            },
            ParamType::Object => json!({}),
        }
    }
}

/// One declared input parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<ParamType>,
    #[serde(rename = "nullable")]
    pub optional: bool,
}

/// Ordered input schema of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolSchema {
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter.
    pub fn required(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.push(name, ty, None, description, false)
    }

    /// Add an optional (nullable) parameter.
    pub fn optional(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.push(name, ty, None, description, true)
    }

    /// Add a required array parameter with typed elements.
    pub fn required_array(self, name: &str, items: ParamType, description: &str) -> Self {
        self.push(name, ParamType::Array, Some(items), description, false)
    }

    fn push(
        mut self,
        name: &str,
        ty: ParamType,
        items: Option<ParamType>,
        description: &str,
        optional: bool,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            ty,
            description: description.to_string(),
            items,
            optional,
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Check the schema is well-formed.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();
        for param in &self.params {
            if !identifier_re().is_match(&param.name) {
                return Err(format!("parameter name '{}' is not an identifier", param.name));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(format!("parameter '{}' is declared twice", param.name));
            }
            if param.description.trim().is_empty() {
                return Err(format!("parameter '{}' has no description", param.name));
            }
            match (param.ty, param.items) {
                (ParamType::Array, None) => {
                    return Err(format!("array parameter '{}' has no element type", param.name))
                }
                (ParamType::Array, Some(ParamType::Array)) => {
                    return Err(format!("array parameter '{}' nests arrays", param.name))
                }
                (ty, Some(_)) if ty != ParamType::Array => {
                    return Err(format!("parameter '{}' is not an array but declares elements", param.name))
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Arguments containing every declared parameter.
    pub fn sample_full(&self) -> Value {
        self.sample(|_| true)
    }

    /// Arguments containing only the required parameters.
    pub fn sample_required(&self) -> Value {
        self.sample(|p| !p.optional)
    }

    fn sample(&self, include: impl Fn(&ParamSpec) -> bool) -> Value {
        let map: Map<String, Value> = self
            .params
            .iter()
            .filter(|p| include(p))
            .map(|p| (p.name.clone(), p.ty.sample(p.items)))
            .collect();
        Value::Object(map)
    }

    /// Render as a JSON Schema object for function calling.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut property = json!({
                "type": param.ty.as_str(),
                "description": param.description,
            });
            if let Some(items) = param.items {
                property["items"] = json!({ "type": items.as_str() });
            }
            properties.insert(param.name.clone(), property);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| !p.optional)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Everything the planner needs to know about a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub inputs: ToolSchema,
    pub output_type: ParamType,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str, inputs: ToolSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            inputs,
            output_type: ParamType::String,
        }
    }

    /// Check the name, description and input schema.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !tool_name_re().is_match(&self.name) {
            return Err(format!(
                "tool name '{}' must be 1-64 characters of letters, digits, '_' or '-'",
                self.name
            ));
        }
        if self.description.trim().is_empty() {
            return Err(format!("tool '{}' has no description", self.name));
        }
        self.inputs
            .validate()
            .map_err(|e| format!("tool '{}': {}", self.name, e))
    }
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid regex"))
}

fn tool_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy_schema() -> ToolSchema {
        ToolSchema::new()
            .required("source_path", ParamType::String, "File to copy.")
            .required("destination_path", ParamType::String, "Where to copy it.")
            .optional("force_overwrite", ParamType::Boolean, "Replace an existing destination.")
    }

    #[test]
    fn test_json_schema_lists_required_only() {
        let schema = copy_schema().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["force_overwrite"]["type"], "boolean");
        assert_eq!(
            schema["required"],
            json!(["source_path", "destination_path"])
        );
    }

    #[test]
    fn test_array_items_rendered() {
        let schema = ToolSchema::new()
            .required_array("input_files", ParamType::String, "PDFs to merge.")
            .to_json_schema();
        assert_eq!(schema["properties"]["input_files"]["items"]["type"], "string");
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_arrays() {
        let dup = copy_schema().required("source_path", ParamType::String, "Again.");
        assert!(dup.validate().unwrap_err().contains("declared twice"));

        let bare_array = ToolSchema::new().required("pages", ParamType::Array, "Pages.");
        assert!(bare_array.validate().unwrap_err().contains("element type"));

        let bad_name = ToolSchema::new().required("Source Path", ParamType::String, "x");
        assert!(bad_name.validate().is_err());
    }

    #[test]
    fn test_samples() {
        let schema = copy_schema();
        let full = schema.sample_full();
        assert_eq!(full.as_object().unwrap().len(), 3);
        assert_eq!(full["force_overwrite"], json!(false));

        let required = schema.sample_required();
        assert!(required.get("force_overwrite").is_none());
        assert_eq!(required["source_path"], json!(""));
    }

    #[test]
    fn test_descriptor_validation() {
        let ok = ToolDescriptor::new("copy_file_tool", "Copies files.", copy_schema());
        assert!(ok.validate().is_ok());

        let bad = ToolDescriptor::new("copy file", "Copies files.", copy_schema());
        assert!(bad.validate().is_err());

        let blank = ToolDescriptor::new("copy_file_tool", "  ", copy_schema());
        assert!(blank.validate().is_err());
    }
}
