use serde::{Deserialize, Deserializer, Serialize};

use crate::coerce;

/// Kind of message template backing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TemplateType {
  #[default]
  #[serde(rename = "text_template")]
  Text,
  #[serde(rename = "image_template")]
  Image,
}

impl TemplateType {
  pub fn as_str(&self) -> &'static str {
    match self {
      TemplateType::Text => "text_template",
      TemplateType::Image => "image_template",
    }
  }

  /// Lenient parse: anything mentioning "image" is an image template,
  /// everything else is text.
  pub fn from_loose(value: &str) -> Self {
    if value.to_ascii_lowercase().contains("image") {
      TemplateType::Image
    } else {
      TemplateType::Text
    }
  }
}

impl<'de> Deserialize<'de> for TemplateType {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(
      value
        .as_ref()
        .and_then(coerce::as_text)
        .map(|s| TemplateType::from_loose(&s))
        .unwrap_or_default(),
    )
  }
}

/// A button as the template catalog describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TemplateButtonDef {
  #[serde(default, deserialize_with = "coerce::text")]
  pub text: String,
  #[serde(rename = "type", default, deserialize_with = "coerce::text")]
  pub button_type: String,
  #[serde(default, deserialize_with = "coerce::non_blank")]
  pub sub_type: Option<String>,
  #[serde(default, deserialize_with = "coerce::non_blank")]
  pub value: Option<String>,
}

/// A catalog entry used as the content source for a new step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDef {
  #[serde(default, deserialize_with = "coerce::text")]
  pub name: String,
  #[serde(rename = "type", default)]
  pub template_type: TemplateType,
  #[serde(default, deserialize_with = "coerce::text")]
  pub body: String,
  #[serde(default, deserialize_with = "coerce::list_or_empty")]
  pub buttons: Vec<TemplateButtonDef>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_template_type_is_lenient() {
    let image: TemplateType = serde_json::from_value(json!("IMAGE_TEMPLATE")).unwrap();
    assert_eq!(image, TemplateType::Image);

    let text: TemplateType = serde_json::from_value(json!(null)).unwrap();
    assert_eq!(text, TemplateType::Text);
  }

  #[test]
  fn test_template_def_defaults() {
    let def: TemplateDef = serde_json::from_value(json!({
      "name": "welcome",
      "type": "text_template",
      "body": "Hi {{1}}",
      "buttons": null,
    }))
    .unwrap();
    assert_eq!(def.name, "welcome");
    assert!(def.buttons.is_empty());
  }
}
