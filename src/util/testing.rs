use std::env;
use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{DepartmentFields, MutationEngine, NodeId, SequentialIdGenerator};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["config::"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // Set up the subscriber with environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // Build and set the subscriber
    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Seed document matching [`demo_engine`], ids `"1"`..`"10"` in document order.
pub const DEMO_SEED: &str = r#"
[[department]]
name = "技术部"
code = "TECH"
manager_name = "张三"
member_count = 45

  [[department.children]]
  name = "前端开发组"
  code = "TECH-FE"
  manager_name = "李四"
  member_count = 15

    [[department.children.children]]
    name = "React团队"
    code = "TECH-FE-REACT"
    manager_name = "王五"
    member_count = 8

    [[department.children.children]]
    name = "Vue团队"
    code = "TECH-FE-VUE"
    manager_name = "赵六"
    member_count = 7

  [[department.children]]
  name = "后端开发组"
  code = "TECH-BE"
  manager_name = "孙七"
  member_count = 20

  [[department.children]]
  name = "测试组"
  code = "TECH-QA"
  manager_name = "周八"
  member_count = 10

[[department]]
name = "销售部"
code = "SALES"
manager_name = "吴九"
member_count = 30

  [[department.children]]
  name = "华北销售区"
  code = "SALES-N"
  manager_name = "郑十"
  member_count = 12

  [[department.children]]
  name = "华南销售区"
  code = "SALES-S"
  manager_name = "钱十一"
  member_count = 18

[[department]]
name = "人力资源部"
code = "HR"
manager_name = "陈十二"
member_count = 8
"#;

/// Demo organization with three roots (`"1"` 技术部, `"7"` 销售部, `"10"` 人力资源部).
pub fn demo_engine() -> MutationEngine<SequentialIdGenerator> {
    let mut engine = MutationEngine::sequential();
    let mut add = |parent: Option<&str>, name: &str, code: &str, manager: &str, members: u32| {
        let parent = parent.map(NodeId::from);
        engine
            .insert(
                parent.as_ref(),
                DepartmentFields::new(name, code)
                    .with_manager(manager)
                    .with_members(members),
            )
            .expect("demo insert")
    };
    add(None, "技术部", "TECH", "张三", 45);
    add(Some("1"), "前端开发组", "TECH-FE", "李四", 15);
    add(Some("2"), "React团队", "TECH-FE-REACT", "王五", 8);
    add(Some("2"), "Vue团队", "TECH-FE-VUE", "赵六", 7);
    add(Some("1"), "后端开发组", "TECH-BE", "孙七", 20);
    add(Some("1"), "测试组", "TECH-QA", "周八", 10);
    add(None, "销售部", "SALES", "吴九", 30);
    add(Some("7"), "华北销售区", "SALES-N", "郑十", 12);
    add(Some("7"), "华南销售区", "SALES-S", "钱十一", 18);
    add(None, "人力资源部", "HR", "陈十二", 8);
    engine
}

// test
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_demo_engine_when_built_then_has_three_roots_and_ten_departments() {
        let engine = demo_engine();
        assert_eq!(engine.arena().len(), 10);
        assert_eq!(
            engine.arena().root_ids(),
            &[NodeId::from("1"), NodeId::from("7"), NodeId::from("10")]
        );
    }
}
