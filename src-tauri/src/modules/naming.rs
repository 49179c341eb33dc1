// Pure logic for tab identity: duplicate detection on open and title disambiguation.
// No Tauri imports allowed.

use serde_json::Value;

use crate::registry::ModuleDescriptor;
use crate::state::Tab;

/// Params entries whose key starts with this prefix and whose value is an
/// object carrying an `id` name a specific record (e.g. `selectedTable`).
const RECORD_KEY_PREFIX: &str = "selected";

/// A record named inside a tab's params.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordRef<'a> {
    pub key: &'a str,
    pub id: &'a Value,
    pub name: Option<&'a str>,
}

/// Finds the record discriminant in `params`, if any.
/// serde_json maps iterate in key order, so the choice is deterministic.
pub fn record_ref(params: &Value) -> Option<RecordRef<'_>> {
    params.as_object()?.iter().find_map(|(key, value)| {
        if !key.starts_with(RECORD_KEY_PREFIX) {
            return None;
        }
        let record = value.as_object()?;
        let id = record.get("id").filter(|id| !id.is_null())?;
        Some(RecordRef {
            key,
            id,
            name: record.get("name").and_then(Value::as_str),
        })
    })
}

/// `None`, `null` and `{}` carry no discriminant.
pub fn is_significant(params: Option<&Value>) -> bool {
    match params {
        None | Some(Value::Null) => false,
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// Whether opening `module_id` with `params` should reactivate `existing`
/// instead of creating a new tab. Bare opens never match anything.
pub fn is_duplicate(existing: &Tab, module_id: &str, params: Option<&Value>) -> bool {
    if existing.module_id != module_id {
        return false;
    }
    let existing_params = existing.params.as_ref();
    if !is_significant(params) || !is_significant(existing_params) {
        return false;
    }
    let (Some(wanted), Some(have)) = (params, existing_params) else {
        return false;
    };

    match (record_ref(wanted), record_ref(have)) {
        (Some(a), Some(b)) if a.key == b.key => a.id == b.id,
        _ => wanted == have,
    }
}

/// Context label for a tab showing a named record, e.g. "Tables - Terrace 4".
pub fn record_label(module: &ModuleDescriptor, params: Option<&Value>) -> Option<String> {
    let name = params.and_then(record_ref)?.name?;
    Some(format!("{} - {}", module.title, name))
}

/// "Title" for the first sibling, "Title N" for the N-th.
pub fn ordinal_title(module: &ModuleDescriptor, position: usize) -> String {
    if position == 0 {
        module.title.clone()
    } else {
        format!("{} {}", module.title, position + 1)
    }
}

/// Title for a tab about to be appended after `siblings` existing tabs of the same module.
pub fn initial_title(module: &ModuleDescriptor, params: Option<&Value>, siblings: usize) -> String {
    record_label(module, params).unwrap_or_else(|| ordinal_title(module, siblings))
}

/// Recomputes ordinal titles for every tab of `module`, by position among
/// that module's tabs in list order. Record-labelled tabs keep their label.
pub fn renumber(tabs: &mut [Tab], module: &ModuleDescriptor) {
    let mut position = 0;
    for tab in tabs.iter_mut().filter(|t| t.module_id == module.id) {
        if record_label(module, tab.params.as_ref()).is_none() {
            tab.title = ordinal_title(module, position);
        }
        position += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_module;
    use rstest::rstest;
    use serde_json::json;

    fn tab(id: &str, module_id: &str, params: Option<Value>) -> Tab {
        Tab {
            id: id.to_string(),
            module_id: module_id.to_string(),
            title: String::new(),
            path: format!("/{}", module_id),
            is_active: false,
            can_close: true,
            error: None,
            params,
        }
    }

    #[test]
    fn test_record_ref_found() {
        let params = json!({"mode": "edit", "selectedTable": {"id": 4, "name": "Terrace"}});
        let record = record_ref(&params).unwrap();
        assert_eq!(record.key, "selectedTable");
        assert_eq!(record.id, &json!(4));
        assert_eq!(record.name, Some("Terrace"));
    }

    #[rstest]
    #[case(json!({"selectedTable": {"name": "No id"}}))]
    #[case(json!({"selectedTable": {"id": null}}))]
    #[case(json!({"selectedTable": 4}))]
    #[case(json!({"table": {"id": 4}}))]
    #[case(json!([1, 2]))]
    fn test_record_ref_absent(#[case] params: Value) {
        assert!(record_ref(&params).is_none());
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(json!(null)), false)]
    #[case(Some(json!({})), false)]
    #[case(Some(json!({"filter": "open"})), true)]
    #[case(Some(json!("raw")), true)]
    fn test_is_significant(#[case] params: Option<Value>, #[case] expected: bool) {
        assert_eq!(is_significant(params.as_ref()), expected);
    }

    #[test]
    fn test_same_record_id_is_duplicate_even_if_rest_differs() {
        let existing = tab("t1", "tables", Some(json!({"selectedTable": {"id": 4, "name": "Old name"}})));
        let wanted = json!({"selectedTable": {"id": 4, "name": "Renamed"}, "extra": true});
        assert!(is_duplicate(&existing, "tables", Some(&wanted)));
    }

    #[test]
    fn test_different_record_id_is_not_duplicate() {
        let existing = tab("t1", "tables", Some(json!({"selectedTable": {"id": 4}})));
        assert!(!is_duplicate(&existing, "tables", Some(&json!({"selectedTable": {"id": 5}}))));
    }

    #[test]
    fn test_other_module_is_never_duplicate() {
        let existing = tab("t1", "tables", Some(json!({"selectedTable": {"id": 4}})));
        assert!(!is_duplicate(&existing, "orders", Some(&json!({"selectedTable": {"id": 4}}))));
    }

    #[test]
    fn test_plain_params_compare_structurally() {
        let existing = tab("t1", "reports", Some(json!({"range": "week", "shop": 2})));
        assert!(is_duplicate(&existing, "reports", Some(&json!({"shop": 2, "range": "week"}))));
        assert!(!is_duplicate(&existing, "reports", Some(&json!({"range": "month", "shop": 2}))));
    }

    #[test]
    fn test_bare_tabs_never_duplicate() {
        let existing = tab("t1", "pos", None);
        assert!(!is_duplicate(&existing, "pos", None));
        assert!(!is_duplicate(&existing, "pos", Some(&json!({}))));

        let with_params = tab("t2", "pos", Some(json!({"cart": 1})));
        assert!(!is_duplicate(&with_params, "pos", None));
    }

    #[rstest]
    #[case(None, 0, "Tables")]
    #[case(None, 1, "Tables 2")]
    #[case(None, 4, "Tables 5")]
    #[case(Some(json!({"selectedTable": {"id": 4, "name": "Terrace"}})), 3, "Tables - Terrace")]
    #[case(Some(json!({"selectedTable": {"id": 4}})), 1, "Tables 2")]
    fn test_initial_title(#[case] params: Option<Value>, #[case] siblings: usize, #[case] expected: &str) {
        let module = test_module("tables", "Tables");
        assert_eq!(initial_title(&module, params.as_ref(), siblings), expected);
    }

    #[test]
    fn test_renumber_only_touches_module_tabs() {
        let module = test_module("pos", "POS");
        let mut tabs = vec![
            tab("p3", "pos", None),
            tab("o1", "orders", None),
            tab("p5", "pos", None),
        ];
        tabs[1].title = "Orders".to_string();

        renumber(&mut tabs, &module);

        let titles: Vec<&str> = tabs.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["POS", "Orders", "POS 2"]);
    }

    #[test]
    fn test_renumber_keeps_record_labels_but_counts_them() {
        let module = test_module("tables", "Tables");
        let mut tabs = vec![
            tab("a", "tables", Some(json!({"selectedTable": {"id": 1, "name": "Bar"}}))),
            tab("b", "tables", None),
        ];
        tabs[0].title = "Tables - Bar".to_string();

        renumber(&mut tabs, &module);

        assert_eq!(tabs[0].title, "Tables - Bar");
        assert_eq!(tabs[1].title, "Tables 2");
    }
}
