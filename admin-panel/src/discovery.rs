use crate::record::FieldRules;

/// Table names offered to the operator: one leading `/` stripped, excluded names dropped.
pub fn discoverable_tables<I, S>(routes: I, rules: &FieldRules) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    routes
        .into_iter()
        .map(|route| {
            let route = route.as_ref();
            route.strip_prefix('/').unwrap_or(route).to_string()
        })
        .filter(|name| !rules.is_excluded(name))
        .collect()
}
