use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type PetId = i64;

#[derive(Debug, Serialize, Deserialize)]
pub struct Pet {
    #[serde(rename = "id")]
    pub id: PetId,
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "status")]
    pub status: PetStatus,
    #[serde(rename = "tags")]
    pub tags: Vec<String>,
    #[serde(rename = "owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<Box<Owner>>,
    #[serde(skip)]
    pub cache_key: u64,
    pub internal: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum PetStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "sold")]
    Sold,
}

#[derive(Debug, Deserialize)]
pub struct NewPet {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "tags", default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "pets")]
    pub pets: Vec<Pet>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(rename = "code")]
    pub code: u16,
    #[serde(rename = "message")]
    pub message: String,
    #[serde(rename = "details")]
    pub details: Details,
}

pub type Details = HashMap<String, String>;
