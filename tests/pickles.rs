use std::convert::Infallible;

use brine::{
    parser,
    pickle::{Document, TagLevel},
    step::RawKeyword,
    Overall, Registry, Result, Runner,
};

#[test]
fn compiles_backgrounds_and_outlines() {
    let docs = parser::load(["tests/features/run/a_calculator.feature"]).unwrap();
    let pickles = &docs[0].pickles;

    assert_eq!(pickles.len(), 4);
    assert!(pickles
        .iter()
        .all(|p| p.steps[0].text == "a calculator" && p.feature_name == "Calculator"));

    let outline = &pickles[3];
    assert!(outline.is_from_outline());
    assert_eq!(outline.raw_name.as_deref(), Some("subtracting"));
    assert_eq!(outline.steps[1].keyword, RawKeyword::When);
    assert_eq!(outline.steps[1].text, "I subtract 4 from 4");
    assert_eq!(
        outline.steps[1].raw_text.as_deref(),
        Some("I subtract <b> from <a>"),
    );
    assert_eq!(outline.line_in_file(), pickles[2].line_in_file());
    assert_ne!(outline.line, pickles[2].line);

    assert_eq!(pickles[1].tags.level(TagLevel::Feature), ["@math"]);
    assert_eq!(pickles[1].tags.level(TagLevel::Scenario), ["@slow"]);
    assert_eq!(pickles[1].tags.flatten(), ["@math", "@slow"]);
}

#[test]
fn executes_deserialized_documents() -> anyhow::Result<()> {
    let doc = serde_json::from_str::<Document>(
        r#"{
            "uri": "memory/accounts.feature",
            "pickles": [{
                "feature_name": "Accounts",
                "name": "opening",
                "uri": "memory/accounts.feature",
                "line": 3,
                "tags": {"feature_level": ["@bank"]},
                "steps": [
                    {"keyword": "Given", "text": "an account", "line": 4},
                    {"keyword": "And", "text": "a deposit of 10", "line": 5},
                    {"keyword": "Then", "text": "the balance is 10", "line": 6}
                ]
            }]
        }"#,
    )?;

    let register = |r: &mut Registry| -> Result<()> {
        _ = r
            .given("an account", |ctx, _| {
                _ = ctx.set("balance", 0);
                Ok::<_, Infallible>(())
            })?
            .given("a deposit of {n:d}", |ctx, args| {
                let n = args.parse::<i64>("n").and_then(|r| r.ok()).unwrap_or(0);
                _ = ctx.set("balance", n);
                Ok::<_, Infallible>(())
            })?
            .then("the balance is {n:d}", |ctx, args| {
                let balance = ctx.get("balance").and_then(|v| v.as_i64());
                let n = args.parse::<i64>("n").and_then(|r| r.ok());
                if balance == n {
                    Ok(())
                } else {
                    Err(format!("balance is {balance:?}"))
                }
            })?;
        Ok(())
    };

    let run = Runner::new(register).run([doc]).unwrap();

    let feature = &run.features()[0];
    assert_eq!(feature.overall(), Some(Overall::Passed));
    assert_eq!(feature.scenarios()[0].steps().len(), 3);
    assert_eq!(run.summary().passed_steps.len(), 3);
    Ok(())
}
