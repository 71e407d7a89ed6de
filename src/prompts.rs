//! Prompts for the remote structured extractor.
//!
//! The model is shown one fixed example order as a formatting guide. The
//! example's `status` is the word `"completed"` even though
//! [`crate::output::OrderRecord::status`] is numeric; the schema coercion in
//! [`crate::pipeline::schema`] maps such words to codes.

use serde_json::{json, Value};

/// Instruction sent in the user turn alongside the image.
pub const USER_INSTRUCTION: &str =
    "Extract the order shown in this image and answer with JSON in the format described.";

/// The canonical example order embedded in the system prompt.
pub fn example_order() -> Value {
    json!({
        "customer_name": "Tony Wang",
        "order_date": "2025-03-25",
        "items": [
            {
                "product_id": "P001",
                "matched_name": "Apple MacBook Air M2",
                "original_input": "mac air laptop",
                "quantity": 2,
                "match_score": 0.92
            },
            {
                "product_id": "P003",
                "matched_name": "Dell 24'' Monitor",
                "original_input": "24 dell screen",
                "quantity": 1,
                "match_score": 0.87
            }
        ],
        "status": "completed"
    })
}

/// Build the system prompt, optionally listing known catalog names.
pub fn system_prompt(catalog_names: &[String]) -> String {
    let mut prompt = format!(
        "Output the content of the image as JSON. Use this structure, for example: {}",
        example_order()
    );

    if !catalog_names.is_empty() {
        prompt.push_str(
            "\n\nKnown product names. When an item refers to one of these, use it as \
             matched_name and keep the text from the image in original_input:",
        );
        for name in catalog_names {
            prompt.push_str("\n- ");
            prompt.push_str(name);
        }
    }

    prompt
}
