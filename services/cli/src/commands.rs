use std::path::Path;

use review_rules::versioning::{BoundExecutor, RunId, VersionId};
use review_rules::{validate_rule_set_json, AppError, FixScoreContext, ReviewContext, RuleSet};
use serde_json::{json, Value};
use tracing::info;

use crate::cli::{EvaluateArgs, EvaluateCommand, RunsCommand, VersionsCommand};
use crate::infra::{print_json, read_json, RuleTooling};

pub(crate) fn validate(file: &Path) -> Result<(), AppError> {
    let candidate = read_json(file)?;
    let report = validate_rule_set_json(&candidate);
    print_json(&report)?;

    if report.valid {
        Ok(())
    } else {
        Err(AppError::Invalid(report))
    }
}

pub(crate) fn seed(tooling: &RuleTooling) -> Result<(), AppError> {
    let outcome = tooling.service.seed_initial_rule_set(&tooling.actor)?;
    info!(
        version = %outcome.version.version_id,
        created = outcome.created,
        "seed finished"
    );
    print_json(&json!({
        "created": outcome.created,
        "version": outcome.version,
    }))
}

pub(crate) fn versions(tooling: &RuleTooling, command: VersionsCommand) -> Result<(), AppError> {
    let service = &tooling.service;

    match command {
        VersionsCommand::Create(args) => {
            let candidate = read_json(&args.file)?;
            let report = validate_rule_set_json(&candidate);
            if !report.valid {
                print_json(&report)?;
                return Err(AppError::Invalid(report));
            }
            let rules: RuleSet = serde_json::from_value(candidate)?;

            let mut version =
                service.create_version(rules, args.name, args.description, &tooling.actor)?;
            if args.activate {
                version = service.activate_version(&version.version_id, &tooling.actor)?;
            }
            print_json(&version)
        }
        VersionsCommand::Activate { version_id } => {
            let version = service.activate_version(&VersionId(version_id), &tooling.actor)?;
            print_json(&version)
        }
        VersionsCommand::List(args) => {
            let versions =
                service.list_versions(args.status.map(Into::into), args.limit, args.offset)?;
            let rows: Vec<Value> = versions
                .iter()
                .map(|version| {
                    json!({
                        "versionId": version.version_id,
                        "versionNumber": version.version_number,
                        "label": version.label(),
                        "status": version.status,
                        "rulesVersion": version.rules.version,
                        "createdById": version.created_by_id,
                        "createdAt": version.created_at,
                        "activatedAt": version.activated_at,
                    })
                })
                .collect();
            print_json(&rows)
        }
        VersionsCommand::Show { version_id } => {
            let version = service.get_version(&VersionId(version_id))?;
            print_json(&version)
        }
        VersionsCommand::Active => {
            let active = service.get_active_version()?;
            print_json(&active)
        }
    }
}

pub(crate) fn runs(tooling: &RuleTooling, command: RunsCommand) -> Result<(), AppError> {
    let service = &tooling.service;

    match command {
        RunsCommand::Pin(args) => {
            let version_id = args.version.map(VersionId);
            let pin = service.pin_version_to_run(&RunId(args.run_id.clone()), version_id.as_ref())?;
            print_json(&json!({ "runId": args.run_id, "pin": pin }))
        }
        RunsCommand::Resolve { run_id } => {
            let bound = service.get_executor_for_run(&RunId(run_id.clone()))?;
            print_json(&json!({
                "runId": run_id,
                "source": bound.source,
                "versionId": bound.version_id,
                "rulesVersion": bound.executor.rule_set().version,
            }))
        }
    }
}

pub(crate) fn evaluate(tooling: &RuleTooling, command: EvaluateCommand) -> Result<(), AppError> {
    match command {
        EvaluateCommand::Confidence(args) => {
            let bound = bound_executor(tooling, &args)?;
            let context: ReviewContext = serde_json::from_value(review_document(read_json(
                &args.context,
            )?))?;
            let outcome = bound.executor.evaluate_confidence(&context)?;
            print_json(&json!({
                "runId": args.run,
                "versionId": bound.version_id,
                "summary": outcome.explanation.summary(),
                "outcome": outcome,
            }))
        }
        EvaluateCommand::Sufficiency(args) => {
            let bound = bound_executor(tooling, &args)?;
            let context: FixScoreContext = serde_json::from_value(read_json(&args.context)?)?;
            let outcome = bound.executor.evaluate_sufficiency(&context)?;
            print_json(&json!({
                "runId": args.run,
                "versionId": bound.version_id,
                "summary": outcome.explanation.summary(),
                "outcome": outcome,
            }))
        }
    }
}

fn bound_executor(
    tooling: &RuleTooling,
    args: &EvaluateArgs,
) -> Result<BoundExecutor, AppError> {
    Ok(tooling
        .service
        .get_executor_for_run(&RunId(args.run.clone()))?)
}

/// Fills in `contentLength` from `content` when a hand-written context omits it.
fn review_document(mut document: Value) -> Value {
    if let Some(object) = document.as_object_mut() {
        if !object.contains_key("contentLength") {
            if let Some(length) = object
                .get("content")
                .and_then(Value::as_str)
                .map(|content| content.chars().count())
            {
                object.insert("contentLength".to_string(), json!(length));
            }
        }
    }
    document
}
