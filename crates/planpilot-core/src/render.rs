//! Default body renderer
//!
//! Emits the marker block followed by Markdown sections. Output is a pure
//! function of `(item, ctx)` and byte-stable: sections appear in a fixed
//! order, child lists in the order the engine supplies, dependencies in
//! sorted id order. Empty fields produce no section at all, not an empty
//! header.

use planpilot_api::{MarkerBlock, PlanItem, RenderContext, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {
    fn render(&self, item: &PlanItem, ctx: &RenderContext) -> String {
        let marker = MarkerBlock::new(
            ctx.plan_id.clone(),
            item.id.clone(),
            item.item_type,
            item.parent_id.clone(),
        );

        let mut out = marker.render();
        out.push('\n');

        if let Some(parent_ref) = &ctx.parent_ref {
            out.push_str(&format!("**Parent:** {parent_ref}\n\n"));
        }

        push_text(&mut out, "Goal", &item.goal);
        if let Some(motivation) = &item.motivation {
            push_text(&mut out, "Motivation", motivation);
        }
        push_bullets(&mut out, "Requirements", &item.requirements);
        push_checkboxes(&mut out, "Acceptance criteria", &item.acceptance_criteria);
        push_bullets(&mut out, "Success metrics", &item.success_metrics);
        push_bullets(&mut out, "Assumptions", &item.assumptions);
        push_bullets(&mut out, "Risks", &item.risks);

        if let Some(verification) = &item.verification {
            let mut section = String::new();
            push_code_bullets(&mut section, "Commands", &verification.commands);
            push_bullets(&mut section, "CI checks", &verification.ci_checks);
            push_bullets(&mut section, "Evidence", &verification.evidence);
            push_bullets(&mut section, "Manual steps", &verification.manual_steps);
            if !section.is_empty() {
                out.push_str("## Verification\n\n");
                out.push_str(&section);
            }
        }

        if let Some(scope) = &item.scope {
            let mut section = String::new();
            push_bullets(&mut section, "In scope", &scope.in_scope);
            push_bullets(&mut section, "Out of scope", &scope.out_scope);
            if !section.is_empty() {
                out.push_str("## Scope\n\n");
                out.push_str(&section);
            }
        }

        if let Some(spec_ref) = &item.spec_ref {
            let mut lines = Vec::new();
            if let Some(url) = &spec_ref.url {
                lines.push(format!("- Source: {url}"));
            }
            if let Some(section) = &spec_ref.section {
                lines.push(format!("- Section: {section}"));
            }
            if let Some(quote) = &spec_ref.quote {
                lines.push(format!("- > {quote}"));
            }
            if !lines.is_empty() {
                out.push_str("## Spec reference\n\n");
                out.push_str(&lines.join("\n"));
                out.push_str("\n\n");
            }
        }

        if let Some(estimate) = &item.estimate {
            let mut parts = Vec::new();
            if let Some(tshirt) = &estimate.tshirt {
                parts.push(format!("size {tshirt}"));
            }
            if let Some(hours) = estimate.hours {
                parts.push(format!("{hours}h"));
            }
            if !parts.is_empty() {
                out.push_str(&format!("**Estimate:** {}\n\n", parts.join(", ")));
            }
        }

        if !ctx.sub_items.is_empty() {
            out.push_str("## Sub-items\n\n");
            for (key, title) in &ctx.sub_items {
                out.push_str(&format!("- {key} {title}\n"));
            }
            out.push('\n');
        }

        if !ctx.dependencies.is_empty() {
            out.push_str("## Depends on\n\n");
            for (dep_id, dep_ref) in &ctx.dependencies {
                out.push_str(&format!("- {dep_ref} ({dep_id})\n"));
            }
            out.push('\n');
        }

        // Single trailing newline, however the body ended.
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}

fn push_text(out: &mut String, header: &str, text: &str) {
    if !text.trim().is_empty() {
        out.push_str(&format!("## {header}\n\n{text}\n\n"));
    }
}

fn push_bullets(out: &mut String, header: &str, entries: &[String]) {
    if !entries.is_empty() {
        out.push_str(&format!("## {header}\n\n"));
        for entry in entries {
            out.push_str(&format!("- {entry}\n"));
        }
        out.push('\n');
    }
}

fn push_checkboxes(out: &mut String, header: &str, entries: &[String]) {
    if !entries.is_empty() {
        out.push_str(&format!("## {header}\n\n"));
        for entry in entries {
            out.push_str(&format!("- [ ] {entry}\n"));
        }
        out.push('\n');
    }
}

fn push_code_bullets(out: &mut String, header: &str, entries: &[String]) {
    if !entries.is_empty() {
        out.push_str(&format!("### {header}\n\n"));
        for entry in entries {
            out.push_str(&format!("- `{entry}`\n"));
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planpilot_api::{Estimate, ItemType, MarkerBlock};
    use std::collections::BTreeMap;

    fn task() -> PlanItem {
        let mut item = PlanItem::new("T2", ItemType::Task, "Implement retries");
        item.goal = "Retries converge".to_string();
        item.requirements = vec!["bounded attempts".to_string()];
        item.acceptance_criteria = vec!["second run is a no-op".to_string()];
        item.parent_id = Some("S1".to_string());
        item.depends_on = vec!["T1".to_string()];
        item
    }

    fn full_ctx() -> RenderContext {
        let mut dependencies = BTreeMap::new();
        dependencies.insert("T1".to_string(), "#4".to_string());
        RenderContext {
            plan_id: "abcdef012345".to_string(),
            parent_ref: Some("#2".to_string()),
            sub_items: vec![],
            dependencies,
        }
    }

    #[test]
    fn body_starts_with_the_marker_block() {
        let body = DefaultRenderer.render(&task(), &full_ctx());
        assert!(body.starts_with("PLANPILOT_META_V1\n"));
        let marker = MarkerBlock::parse(&body).unwrap();
        assert_eq!(marker.plan_id, "abcdef012345");
        assert_eq!(marker.item_id, "T2");
        assert_eq!(marker.item_type, ItemType::Task);
        assert_eq!(marker.parent_id.as_deref(), Some("S1"));
    }

    #[test]
    fn render_is_byte_stable() {
        let item = task();
        let ctx = full_ctx();
        assert_eq!(
            DefaultRenderer.render(&item, &ctx),
            DefaultRenderer.render(&item, &ctx)
        );
    }

    #[test]
    fn empty_fields_produce_no_headers() {
        let mut item = task();
        item.success_metrics = Vec::new();
        item.risks = Vec::new();
        item.estimate = Some(Estimate::default());
        let body = DefaultRenderer.render(&item, &full_ctx());
        assert!(!body.contains("## Success metrics"));
        assert!(!body.contains("## Risks"));
        assert!(!body.contains("**Estimate:**"));
    }

    #[test]
    fn dependencies_render_in_sorted_id_order() {
        let mut ctx = full_ctx();
        ctx.dependencies.insert("T0".to_string(), "#9".to_string());
        let body = DefaultRenderer.render(&task(), &ctx);
        let t0 = body.find("(T0)").unwrap();
        let t1 = body.find("(T1)").unwrap();
        assert!(t0 < t1);
    }

    #[test]
    fn sub_items_render_in_supplied_order() {
        let mut ctx = full_ctx();
        ctx.dependencies.clear();
        ctx.sub_items = vec![
            ("#5".to_string(), "first".to_string()),
            ("#3".to_string(), "second".to_string()),
        ];
        let body = DefaultRenderer.render(&task(), &ctx);
        assert!(body.find("#5 first").unwrap() < body.find("#3 second").unwrap());
    }

    #[test]
    fn preliminary_context_omits_reference_sections() {
        let ctx = RenderContext::preliminary("abcdef012345", None);
        let body = DefaultRenderer.render(&task(), &ctx);
        assert!(!body.contains("## Sub-items"));
        assert!(!body.contains("## Depends on"));
        assert!(!body.contains("**Parent:**"));
    }
}
