//! Filter form fields feeding the list query.

use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub name: String,
    pub value: String,
    /// Changes to this field trigger a debounced reset.
    pub auto_filter: bool,
}

/// The named fields of a `[data-filter-form]` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterForm {
    fields: Vec<FilterField>,
}

impl FilterForm {
    pub fn new(fields: Vec<FilterField>) -> Self {
        Self { fields }
    }

    /// Read the first filter form in `html`, if there is one.
    ///
    /// Field values follow form submission rules: unchecked checkboxes and
    /// radios are left out, a select contributes its selected option (or the
    /// first one), a textarea its text.
    pub fn from_html(html: &str) -> Option<Self> {
        let document = Html::parse_document(html);
        let form_selector = Selector::parse("[data-filter-form]").ok()?;
        let field_selector = Selector::parse("input[name], select[name], textarea[name]").ok()?;

        let form = document.select(&form_selector).next()?;
        let fields = form.select(&field_selector).filter_map(read_field).collect();
        Some(Self { fields })
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }

    pub fn is_auto_filter(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name && f.auto_filter)
    }

    /// Set a field's value, adding the field if the form did not have it.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value.to_string(),
            None => self
                .fields
                .push(FilterField { name: name.to_string(), value: value.to_string(), auto_filter: false }),
        }
    }

    /// Query parameters for every field with a non-blank value.
    pub fn active_params(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|f| !f.value.trim().is_empty())
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }
}

fn read_field(element: ElementRef<'_>) -> Option<FilterField> {
    let el = element.value();
    let name = el.attr("name")?.to_string();
    let auto_filter = el.attr("data-auto-filter").is_some();

    let value = match el.name() {
        "input" => {
            let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "reset" | "image" | "file" => return None,
                "checkbox" | "radio" => {
                    el.attr("checked")?;
                    el.attr("value").unwrap_or("on").to_string()
                }
                _ => el.attr("value").unwrap_or_default().to_string(),
            }
        }
        "select" => selected_option(element),
        _ => element.text().collect::<String>(),
    };

    Some(FilterField { name, value, auto_filter })
}

fn selected_option(select: ElementRef<'_>) -> String {
    let Ok(options) = Selector::parse("option") else {
        return String::new();
    };
    let mut all = select.select(&options);
    let chosen = select
        .select(&options)
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| all.next());

    chosen
        .map(|o| match o.value().attr("value") {
            Some(v) => v.to_string(),
            None => o.text().collect::<String>().trim().to_string(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <form data-filter-form>
            <input name="q" value="summer">
            <input name="empty" value="  ">
            <select name="status" data-auto-filter>
                <option value="">Any</option>
                <option value="active" selected>Active</option>
            </select>
            <select name="sort"><option>newest</option><option>oldest</option></select>
            <input type="checkbox" name="mine" checked>
            <input type="checkbox" name="archived" value="1">
            <textarea name="notes">vip</textarea>
            <button type="submit" name="go">Go</button>
        </form>
    "#;

    #[test]
    fn test_reads_fields() {
        let form = FilterForm::from_html(FORM).unwrap();
        assert_eq!(form.value("q"), Some("summer"));
        assert_eq!(form.value("status"), Some("active"));
        assert_eq!(form.value("sort"), Some("newest"));
        assert_eq!(form.value("mine"), Some("on"));
        assert_eq!(form.value("archived"), None);
        assert_eq!(form.value("notes"), Some("vip"));
        assert_eq!(form.value("go"), None);
        assert!(form.is_auto_filter("status"));
        assert!(!form.is_auto_filter("q"));
    }

    #[test]
    fn test_active_params_skip_blank() {
        let form = FilterForm::from_html(FORM).unwrap();
        let params = form.active_params();
        assert!(params.contains(&("q".to_string(), "summer".to_string())));
        assert!(!params.iter().any(|(k, _)| k == "empty"));
    }

    #[test]
    fn test_set_value() {
        let mut form = FilterForm::from_html(FORM).unwrap();
        form.set("q", "");
        form.set("region", "north");
        assert!(!form.active_params().iter().any(|(k, _)| k == "q"));
        assert_eq!(form.value("region"), Some("north"));
    }

    #[test]
    fn test_missing_form() {
        assert!(FilterForm::from_html("<div></div>").is_none());
    }
}
