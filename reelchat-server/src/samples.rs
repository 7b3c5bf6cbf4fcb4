//! Fixed example payloads served without touching any session state

use axum::Json;
use serde_json::{json, Value};

const COMEDY_QUESTION: &str = "Can you recommend a good comedy movie?";
const COMEDY_ANSWER: &str =
    "Sure! You might enjoy 'The Grand Budapest Hotel' — it's quirky and hilarious.";
const FOLLOW_UP_QUESTION: &str = "Is it like any other movies?";
const FOLLOW_UP_ANSWER: &str =
    "Yes, if you like Wes Anderson films, try 'Moonrise Kingdom' or 'Fantastic Mr. Fox'.";

pub fn sample_chats() -> Value {
    json!({
        "conversation_1": [
            { "role": "user", "content": COMEDY_QUESTION },
            { "role": "assistant", "content": COMEDY_ANSWER },
            { "role": "user", "content": FOLLOW_UP_QUESTION },
            { "role": "assistant", "content": FOLLOW_UP_ANSWER }
        ]
    })
}

pub fn training_sample() -> Value {
    json!({
        "format": "JSONL",
        "samples": [
            { "input": COMEDY_QUESTION, "output": COMEDY_ANSWER },
            { "input": FOLLOW_UP_QUESTION, "output": FOLLOW_UP_ANSWER }
        ]
    })
}

pub async fn sample_chats_handler() -> Json<Value> {
    Json(sample_chats())
}

pub async fn training_sample_handler() -> Json<Value> {
    Json(training_sample())
}
