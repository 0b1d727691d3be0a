use std::collections::BTreeMap;

use proptest::prelude::*;
use txfmt::hash_tag::hash_tag;
use txfmt::suggestions::{levenshtein, percent_diff};
use txfmt::validators::ValidatorConfig;
use txfmt::{Handler, Language, Method, Mode, PluralRule, PseudoType, Resource, Store};

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("valid key regex")
}

// Mixes Greek and Cyrillic into the values so escaping contracts that
// transform non-Latin-1 text (Java \uXXXX) get exercised.
fn value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex(
        "[A-Za-z0-9α-ωа-я][A-Za-z0-9α-ωа-я _\\-\\.,!\\?]{0,28}[A-Za-z0-9α-ωа-я]",
    )
    .expect("valid value regex")
}

fn dataset_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 1..8)
}

fn properties_content(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

fn strings_content(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        out.push_str(&format!("\"{}\" = \"{}\";\n", key, value));
    }
    out
}

fn seeded(method: Method) -> (Store, Handler) {
    let mut store = Store::new();
    store.add_resource(Resource::new("proj.app", "app", method, "en"));
    let mut handler = Handler::new(method);
    handler.bind_resource("proj.app");
    (store, handler)
}

fn import(
    store: &mut Store,
    handler: &mut Handler,
    content: &str,
    code: &str,
    is_source: bool,
) -> (usize, usize) {
    handler.bind_content(content);
    handler
        .set_language(Some(Language::from_code(code)))
        .unwrap();
    handler.parse_file(is_source).unwrap();
    handler
        .save2db(store, is_source, &ValidatorConfig::default())
        .unwrap()
}

proptest! {
    #[test]
    fn properties_import_compile_roundtrip(values in dataset_strategy()) {
        let (mut store, mut handler) = seeded(Method::Properties);
        import(&mut store, &mut handler, &properties_content(&values), "en", true);

        let translated: BTreeMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.clone(), format!("EL {}", v)))
            .collect();
        import(&mut store, &mut handler, &properties_content(&translated), "el", false);

        let compiled = handler.compile(&store, Mode::DEFAULT, None).unwrap();
        let compiled = String::from_utf8(compiled).unwrap();

        let mut check = Handler::new(Method::Properties);
        check.bind_resource("proj.app");
        check.bind_content(compiled);
        check.set_language(Some(Language::from_code("el"))).unwrap();
        check.parse_file(false).unwrap();
        for (key, value) in &translated {
            let gt = check.stringset().get(key, "", PluralRule::Other);
            prop_assert_eq!(gt.map(|g| g.translation.as_str()), Some(value.as_str()));
        }
    }

    #[test]
    fn strings_import_compile_roundtrip(values in dataset_strategy()) {
        let (mut store, mut handler) = seeded(Method::Strings);
        import(&mut store, &mut handler, &strings_content(&values), "en", true);

        let translated: BTreeMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.clone(), format!("EL {}", v)))
            .collect();
        import(&mut store, &mut handler, &strings_content(&translated), "el", false);

        let compiled = handler.compile(&store, Mode::DEFAULT, None).unwrap();
        let compiled = String::from_utf8(compiled).unwrap();

        let mut check = Handler::new(Method::Strings);
        check.bind_resource("proj.app");
        check.bind_content(compiled);
        check.set_language(Some(Language::from_code("el"))).unwrap();
        check.parse_file(false).unwrap();
        for (key, value) in &translated {
            let gt = check.stringset().get(key, "", PluralRule::Other);
            prop_assert_eq!(gt.map(|g| g.translation.as_str()), Some(value.as_str()));
        }
    }

    #[test]
    fn source_import_is_idempotent(values in dataset_strategy()) {
        let (mut store, mut handler) = seeded(Method::Properties);
        let content = properties_content(&values);
        import(&mut store, &mut handler, &content, "en", true);
        prop_assert_eq!(import(&mut store, &mut handler, &content, "en", true), (0, 0));
    }

    #[test]
    fn pseudo_keeps_printf_placeholders(
        prefix in value_strategy(),
        suffix in value_strategy(),
        spec in prop::sample::select(vec!["%s", "%d", "%1$s", "%(name)s", "%.2f"]),
    ) {
        let text = format!("{} {} {}", prefix, spec, suffix);
        for pseudo in [PseudoType::Brackets, PseudoType::Unicode, PseudoType::Extend] {
            let out = pseudo.compile(&text);
            prop_assert!(out.contains(spec), "{:?} mangled {:?} into {:?}", pseudo, spec, out);
        }
    }

    #[test]
    fn hash_tag_is_stable_hex(source in value_strategy(), context in key_strategy()) {
        let tag = hash_tag(&source, &context);
        prop_assert_eq!(tag.len(), 32);
        prop_assert!(tag.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        prop_assert_eq!(tag.clone(), hash_tag(&source, &context));
        prop_assert_ne!(tag, hash_tag(&format!("{}x", source), &context));
    }

    #[test]
    fn levenshtein_basics(a in value_strategy(), b in value_strategy()) {
        prop_assert_eq!(levenshtein(&a, &a), 0);
        prop_assert_eq!(levenshtein(&a, &b), levenshtein(&b, &a));
        prop_assert!(levenshtein(&a, &b) <= a.chars().count().max(b.chars().count()));
        if a != b {
            prop_assert!(percent_diff(&a, &b) > 0.0);
        }
    }
}
