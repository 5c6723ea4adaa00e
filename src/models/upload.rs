use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

impl UploadResponse {
    pub fn for_file(original_name: &str) -> Self {
        Self { message: format!("File {} uploaded successfully.", original_name) }
    }
}
