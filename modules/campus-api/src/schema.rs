// Tool definitions in the shape chat layers expect: name, description and
// a JSON schema of the arguments generated from the input types.

use schemars::{schema_for, JsonSchema};
use serde::Serialize;
use serde_json::Value;

use crate::tools::{EventFilter, GraphQuery, PeopleQuery, ResearchQuery, ToolName};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Self-contained argument schema: no `$ref`, no `definitions`.
pub fn input_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_default();

    let definitions = value.get("definitions").cloned();
    if let Some(definitions) = definitions {
        inline_refs(&mut value, &definitions);
    }
    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
        map.remove("title");
    }
    value
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("$ref").cloned() {
                if let Some(def) = path
                    .strip_prefix("#/definitions/")
                    .and_then(|name| definitions.get(name))
                {
                    *value = def.clone();
                    inline_refs(value, definitions);
                    return;
                }
            }

            // `allOf: [x]` is how schemars wraps a documented `$ref`.
            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if let [single] = all_of.as_slice() {
                    let description = map.get("description").cloned();
                    *value = single.clone();
                    inline_refs(value, definitions);
                    if let (Some(description), Value::Object(inlined)) = (description, &mut *value) {
                        inlined.insert("description".into(), description);
                    }
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

fn definition(tool: ToolName, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: tool.as_str().to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// The four query tools, in a fixed order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        definition(
            ToolName::GetEvents,
            "List upcoming or past talks, workshops and other events. \
             Filter by a preset range or explicit dates, by type, or by keyword.",
            input_schema::<EventFilter>(),
        ),
        definition(
            ToolName::SearchPeople,
            "Search people, faculty and researchers by name or keyword, optionally \
             filtered by role. Returns contact details, roles and research interests.",
            input_schema::<PeopleQuery>(),
        ),
        definition(
            ToolName::SearchResearch,
            "Explore research areas and the projects within them.",
            input_schema::<ResearchQuery>(),
        ),
        definition(
            ToolName::SearchGraph,
            "Look up a person or organizational unit in the institutional graph and \
             return its direct relationships: affiliations, leadership and supervision.",
            input_schema::<GraphQuery>(),
        ),
    ]
}
