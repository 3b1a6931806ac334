use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A public form body split into plain values and file parts.
#[derive(Debug, Default)]
pub struct ParsedBody {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

/// Parse a request body based on its Content-Type. Multipart bodies go through
/// [`parse_multipart`] instead.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<ParsedBody, String> {
    let ct = content_type.unwrap_or("application/json");

    let fields = if ct.contains("application/json") {
        parse_json(body)?
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)?
    } else {
        parse_json(body).or_else(|_| parse_form_urlencoded(body))?
    };

    Ok(ParsedBody {
        fields,
        files: Vec::new(),
    })
}

fn parse_json(body: &[u8]) -> Result<Map<String, Value>, String> {
    match serde_json::from_slice::<Value>(body).map_err(|e| format!("Invalid JSON: {e}"))? {
        Value::Object(map) => Ok(map),
        _ => Err("Expected a JSON object".to_string()),
    }
}

/// Repeated keys keep the last value, the way a browser checkbox/hidden pair resolves.
fn parse_form_urlencoded(body: &[u8]) -> Result<Map<String, Value>, String> {
    std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    Ok(form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect())
}

/// Parse multipart form data. Parts with a filename become [`UploadedFile`]s; empty
/// file inputs (no filename, no bytes) are skipped.
pub async fn parse_multipart(
    headers: &HeaderMap,
    body: Bytes,
    max_file_size: usize,
) -> Result<ParsedBody, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parsed = ParsedBody::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("File read error: {e}"))?;
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }
            if bytes.len() > max_file_size {
                return Err(format!(
                    "File '{filename}' exceeds the {} KB limit",
                    max_file_size / 1024
                ));
            }
            parsed.files.push(UploadedFile {
                field: name,
                filename,
                content_type,
                bytes,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| format!("Field read error: {e}"))?;
            parsed.fields.insert(name, Value::String(value));
        }
    }

    Ok(parsed)
}
