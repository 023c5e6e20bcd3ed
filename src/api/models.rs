//! # Modelos JSON de la API
//! src/api/models.rs
//!
//! Los nombres de campo en PascalCase son parte del contrato con los
//! clientes existentes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "ErrorMessage")]
    pub error_message: String,

    #[serde(rename = "CorrelationID")]
    pub correlation_id: String,

    /// Solo presente cuando el error ocurrió después de crear la tarea
    #[serde(rename = "ImageID", default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImageResponse {
    #[serde(rename = "ImageID")]
    pub image_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetImageResponse {
    #[serde(rename = "ASCIIValue")]
    pub ascii_value: String,

    #[serde(rename = "Finished")]
    pub finished: bool,

    #[serde(rename = "ErrorMessage")]
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetImageListResponse {
    #[serde(rename = "ImageIDList")]
    pub image_id_list: Vec<Uuid>,
}
