//! Reads a write request body into text fields plus an optional
//! staged image, whatever encoding the client used.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::state::AppState;
use crate::uploads::{StagedImage, UploadError, IMAGE_FIELD};

#[derive(Debug, Default)]
pub struct SubmittedForm {
    fields: HashMap<String, String>,
    image: Option<StagedImage>,
}

impl SubmittedForm {
    /// A submitted text value. Blank values count as not submitted.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    pub fn take_image(&mut self) -> Option<StagedImage> {
        self.image.take()
    }
}

pub async fn read_form(state: &AppState, request: Request) -> Result<SubmittedForm, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok());

    let Some(content_type) = content_type else {
        return Ok(SubmittedForm::default());
    };

    match content_type.essence_str() {
        "multipart/form-data" => read_multipart(state, request).await,
        "application/json" => read_json(request).await,
        "application/x-www-form-urlencoded" => {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            Ok(SubmittedForm {
                fields,
                image: None,
            })
        }
        _ => Ok(SubmittedForm::default()),
    }
}

async fn read_json(request: Request) -> Result<SubmittedForm, ApiError> {
    let Json(object) = Json::<Map<String, Value>>::from_request(request, &())
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?;

    let fields = object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect();

    Ok(SubmittedForm {
        fields,
        image: None,
    })
}

async fn read_multipart(state: &AppState, request: Request) -> Result<SubmittedForm, ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?;

    let mut form = SubmittedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name.as_deref() {
            // Browsers send an empty part when no file was picked.
            Some("") => continue,
            Some(_) => {
                if name != IMAGE_FIELD {
                    return Err(UploadError::UnexpectedField(name).into());
                }
                if form.image.is_some() {
                    return Err(UploadError::TooManyFiles.into());
                }
                form.image = Some(state.uploads.stage(field).await?);
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.to_string()))?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
