#![allow(missing_docs, unused_results)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use intercept_core::{
    AssemblyName, Attribute, CallException, CallInvocation, CallResult, HandlerDescriptor,
    MethodDecl, MethodSignature, TypeInfo,
};
use intercept_core::logging::capture_logs;
use intercept_pipeline::{FnInterceptor, Interceptor, Next};
use intercept_policy::{AttributeDrivenPolicy, InterceptorRegistry, RuleDrivenPolicy};
use intercept_rules::MatchingRule;
use intercept_rules::rules::NameRule;
use intercept_runtime::{
    BehaviorSet, Dispatch, Intercept, InterceptingProxy, InterfaceProxyFactory,
    VirtualMethodProxyFactory,
};
use intercept_settings::InterceptSettings;
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
#[error("insufficient funds: balance {balance}, requested {requested}")]
struct InsufficientFunds {
    balance: i64,
    requested: i64,
}

type Journal = Arc<Mutex<Vec<String>>>;

struct Account {
    ty: Arc<TypeInfo>,
    balance: Mutex<i64>,
    journal: Journal,
}

impl Account {
    fn new(ty: Arc<TypeInfo>, balance: i64, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            ty,
            balance: Mutex::new(balance),
            journal: Arc::clone(journal),
        })
    }

    fn withdraw(&self, amount: i64) -> Result<i64, InsufficientFunds> {
        let mut balance = self.balance.lock();
        if amount > *balance {
            return Err(InsufficientFunds {
                balance: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }
}

impl Dispatch for Account {
    fn type_info(&self) -> Arc<TypeInfo> {
        Arc::clone(&self.ty)
    }

    fn invoke(&self, method: &MethodSignature, arguments: &mut [Value]) -> anyhow::Result<Option<Value>> {
        self.journal.lock().push("target".to_string());
        let amount = arguments.first().and_then(Value::as_i64).unwrap_or(0);
        match method.name() {
            "Deposit" => {
                *self.balance.lock() += amount;
                Ok(None)
            }
            "Withdraw" => Ok(Some(json!(self.withdraw(amount)?))),
            "TryWithdraw" => {
                let ok = match self.withdraw(amount) {
                    Ok(remaining) => {
                        arguments[1] = json!(remaining);
                        true
                    }
                    Err(_) => false,
                };
                Ok(Some(json!(ok)))
            }
            "get_Balance" | "Audit" => Ok(Some(json!(*self.balance.lock()))),
            other => anyhow::bail!("unknown method {other}"),
        }
    }
}

fn bank() -> AssemblyName {
    AssemblyName::new("Bank").with_version("1.0.0.0")
}

fn contract() -> Arc<TypeInfo> {
    TypeInfo::interface("Bank.IAccount", bank())
        .method(MethodDecl::new("Deposit").param("amount", "System.Int64"))
        .method(
            MethodDecl::new("Withdraw")
                .param("amount", "System.Int64")
                .returns("System.Int64"),
        )
        .method(
            MethodDecl::new("TryWithdraw")
                .param("amount", "System.Int64")
                .out_param("remaining", "System.Int64")
                .returns("System.Boolean"),
        )
        .method(MethodDecl::getter("Balance", "System.Int64").attribute(Attribute::no_policies()))
        .build()
}

fn account_type(contract: &Arc<TypeInfo>) -> Arc<TypeInfo> {
    TypeInfo::class("Bank.Account", bank())
        .implements(Arc::clone(contract))
        .method(MethodDecl::new("Deposit").param("amount", "System.Int64").overridable())
        .method(
            MethodDecl::new("Withdraw")
                .param("amount", "System.Int64")
                .returns("System.Int64")
                .overridable()
                .attribute(Attribute::handler(HandlerDescriptor::new("Audit"))),
        )
        .method(
            MethodDecl::new("TryWithdraw")
                .param("amount", "System.Int64")
                .out_param("remaining", "System.Int64")
                .returns("System.Boolean"),
        )
        .method(MethodDecl::getter("Balance", "System.Int64"))
        .build()
}

#[derive(Default)]
struct CountHandler {
    count: AtomicUsize,
}

impl Interceptor for CountHandler {
    fn name(&self) -> &str {
        "count"
    }

    fn invoke(&self, call: &mut CallInvocation, next: Next<'_>) -> CallResult {
        self.count.fetch_add(1, Ordering::SeqCst);
        next.invoke(call)
    }
}

fn recording(name: &'static str, journal: &Journal) -> Arc<dyn Interceptor> {
    let journal = Arc::clone(journal);
    Arc::new(FnInterceptor::new(name, move |call, next| {
        journal.lock().push(format!("enter({name})"));
        let result = next.invoke(call);
        journal.lock().push(format!("exit({name})"));
        result
    }))
}

fn withdraw_rule() -> MatchingRule {
    MatchingRule::Name(NameRule::new("Withdraw").unwrap())
}

fn proxy(intercept: &Intercept, balance: i64, journal: &Journal, behaviors: BehaviorSet) -> InterceptingProxy {
    let contract = contract();
    let account = Account::new(account_type(&contract), balance, journal);
    intercept
        .through_proxy(contract, account, &InterfaceProxyFactory::new(), behaviors)
        .unwrap()
}

#[test]
fn withdraw_policy_counts_only_withdrawals() {
    let count = Arc::new(CountHandler::default());
    let journal = Journal::default();
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new())).with_policy(Arc::new(
        RuleDrivenPolicy::new("withdrawals")
            .with_rule(withdraw_rule())
            .with_handler(Arc::clone(&count) as Arc<dyn Interceptor>)
            .with_handler(recording("log", &journal)),
    ));
    let proxy = proxy(&intercept, 100, &journal, BehaviorSet::new());

    proxy.invoke("Deposit", vec![json!(50)]).unwrap();
    assert_eq!(*journal.lock(), vec!["target"]);

    for _ in 0..3 {
        let result = proxy.invoke("Withdraw", vec![json!(10)]).unwrap();
        assert!(!result.is_exception());
    }
    assert_eq!(count.count.load(Ordering::SeqCst), 3);
    assert_eq!(
        proxy.invoke("get_Balance", Vec::new()).unwrap().return_value(),
        Some(&json!(120))
    );
}

#[test]
fn behaviors_and_handlers_nest_in_order() {
    let journal = Journal::default();
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new())).with_policy(Arc::new(
        RuleDrivenPolicy::new("withdrawals")
            .with_rule(withdraw_rule())
            .with_handler(recording("handler", &journal)),
    ));
    let behaviors = BehaviorSet::new()
        .with_attached(recording("first", &journal))
        .with_attached(recording("second", &journal));
    let proxy = proxy(&intercept, 100, &journal, behaviors);

    proxy.invoke("Withdraw", vec![json!(1)]).unwrap();
    assert_eq!(
        *journal.lock(),
        vec![
            "enter(first)",
            "enter(second)",
            "enter(handler)",
            "target",
            "exit(handler)",
            "exit(second)",
            "exit(first)",
        ]
    );
}

#[test]
fn short_circuit_skips_target_and_later_units() {
    let journal = Journal::default();
    let deny: Arc<dyn Interceptor> = Arc::new(FnInterceptor::new("deny", |call, next| {
        let amount = call.inputs().get_by_name("amount").and_then(Value::as_i64);
        if amount.is_some_and(|a| a > 1_000) {
            return call.create_exception(CallException::msg("withdrawal limit exceeded"));
        }
        next.invoke(call)
    }));
    let behaviors = BehaviorSet::new()
        .with_attached(recording("outer", &journal))
        .with_attached(deny)
        .with_attached(recording("inner", &journal));
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
    let proxy = proxy(&intercept, 5_000, &journal, behaviors);

    let result = proxy.invoke("Withdraw", vec![json!(2_000)]).unwrap();
    assert_eq!(
        result.exception().map(ToString::to_string).as_deref(),
        Some("withdrawal limit exceeded")
    );
    assert_eq!(*journal.lock(), vec!["enter(outer)", "exit(outer)"]);
}

#[test]
fn target_errors_keep_their_type() {
    let journal = Journal::default();
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
    let proxy = proxy(&intercept, 20, &journal, BehaviorSet::new());

    let result = proxy.invoke("Withdraw", vec![json!(50)]).unwrap();
    assert!(result.is_exception());
    assert!(result.outputs().is_empty());
    let error = result.exception().unwrap().downcast_ref::<InsufficientFunds>().unwrap();
    assert_eq!((error.balance, error.requested), (20, 50));
    assert!(result.into_result().is_err());
}

#[test]
fn out_parameters_reach_the_result() {
    let journal = Journal::default();
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
    let proxy = proxy(&intercept, 30, &journal, BehaviorSet::new());

    let result = proxy.invoke("TryWithdraw", vec![json!(10), Value::Null]).unwrap();
    assert_eq!(result.return_value(), Some(&json!(true)));
    assert_eq!(result.output("remaining"), Some(&json!(20)));
}

#[test]
fn context_set_before_the_call_is_visible_on_the_result() {
    let stamp: Arc<dyn Interceptor> = Arc::new(FnInterceptor::new("stamp", |call, next| {
        call.context().insert("request-id", json!("r-42"));
        let result = next.invoke(call);
        result.context().insert("handled", json!(true));
        result
    }));
    let journal = Journal::default();
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
    let proxy = proxy(&intercept, 30, &journal, BehaviorSet::new().with_attached(stamp));

    let result = proxy.invoke("Deposit", vec![json!(1)]).unwrap();
    assert_eq!(result.context().get("request-id"), Some(json!("r-42")));
    assert_eq!(result.context().get("handled"), Some(json!(true)));
}

#[test]
fn no_policies_marker_disables_every_policy() {
    let count = Arc::new(CountHandler::default());
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new())).with_policy(Arc::new(
        RuleDrivenPolicy::new("everything")
            .with_rule(MatchingRule::Always)
            .with_handler(Arc::clone(&count) as Arc<dyn Interceptor>),
    ));
    let journal = Journal::default();
    let proxy = proxy(&intercept, 30, &journal, BehaviorSet::new());

    proxy.invoke("get_Balance", Vec::new()).unwrap();
    assert_eq!(count.count.load(Ordering::SeqCst), 0);
    proxy.invoke("Deposit", vec![json!(1)]).unwrap();
    assert_eq!(count.count.load(Ordering::SeqCst), 1);
}

#[test]
fn attribute_handlers_resolve_with_interception_context() {
    let seen = Journal::default();
    let audits = Arc::new(AtomicUsize::new(0));
    let mut registry = InterceptorRegistry::new();
    {
        let seen = Arc::clone(&seen);
        let audits = Arc::clone(&audits);
        registry.register("Audit", move |_, ctx| {
            seen.lock().push(format!(
                "{}:{}",
                ctx.interceptor.as_deref().unwrap_or("?"),
                ctx.contract.as_ref().map(|c| c.full_name()).unwrap_or_default()
            ));
            let audits = Arc::clone(&audits);
            let unit: Arc<dyn Interceptor> = Arc::new(FnInterceptor::new("audit", move |call, next| {
                audits.fetch_add(1, Ordering::SeqCst);
                next.invoke(call)
            }));
            Ok(unit)
        });
    }
    let intercept =
        Intercept::new(Arc::new(registry)).with_policy(Arc::new(AttributeDrivenPolicy::new()));
    let journal = Journal::default();
    let proxy = proxy(&intercept, 30, &journal, BehaviorSet::new());

    assert_eq!(*seen.lock(), vec!["interface:Bank.IAccount"]);
    proxy.invoke("Withdraw", vec![json!(5)]).unwrap();
    proxy.invoke("Deposit", vec![json!(5)]).unwrap();
    assert_eq!(audits.load(Ordering::SeqCst), 1);
}

#[test]
fn settings_declared_policies_drive_interception() {
    let count = Arc::new(CountHandler::default());
    let mut registry = InterceptorRegistry::new();
    registry.register_instance("Count", Arc::clone(&count) as Arc<dyn Interceptor>);

    let settings: InterceptSettings = serde_json::from_value(json!({
        "pipeline": { "cachePipelines": false },
        "policies": [
            {
                "name": "withdrawals",
                "rules": [
                    { "kind": "name", "patterns": ["Withdraw", "TryWithdraw"] },
                    { "kind": "assembly", "name": "Bank, Version=1.0.0.0" }
                ],
                "handlers": [{ "type": "Count" }]
            },
            {
                "name": "deposits",
                "rules": [{ "kind": "name", "patterns": ["Deposit"] }],
                "handlers": [{ "type": "Count" }]
            }
        ],
        "disabledPolicies": ["deposits"]
    }))
    .unwrap();
    let intercept = Intercept::from_settings(&settings, Arc::new(registry), Vec::new()).unwrap();
    assert_eq!(intercept.policies().names(), vec!["withdrawals"]);

    let journal = Journal::default();
    let proxy = proxy(&intercept, 100, &journal, BehaviorSet::new());
    proxy.invoke("Deposit", vec![json!(1)]).unwrap();
    proxy.invoke("Withdraw", vec![json!(1)]).unwrap();
    proxy.invoke("TryWithdraw", vec![json!(1), Value::Null]).unwrap();
    assert_eq!(count.count.load(Ordering::SeqCst), 2);
}

#[test]
fn type_proxy_intercepts_virtual_methods() {
    let count = Arc::new(CountHandler::default());
    let contract = contract();
    let account_type = account_type(&contract);
    let journal = Journal::default();
    let account = Account::new(Arc::clone(&account_type), 10, &journal);
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
    let proxy = intercept
        .through_proxy(
            Arc::clone(&account_type),
            account,
            &VirtualMethodProxyFactory::new(),
            BehaviorSet::new().with_attached(Arc::clone(&count) as Arc<dyn Interceptor>),
        )
        .unwrap();

    proxy.invoke("Deposit", vec![json!(1)]).unwrap();
    proxy.invoke("TryWithdraw", vec![json!(1), Value::Null]).unwrap();
    assert_eq!(count.count.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_calls_share_one_proxy() {
    let count = Arc::new(CountHandler::default());
    let journal = Journal::default();
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
    let proxy = proxy(
        &intercept,
        0,
        &journal,
        BehaviorSet::new().with_attached(Arc::clone(&count) as Arc<dyn Interceptor>),
    );

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    proxy.invoke("Deposit", vec![json!(1)]).unwrap();
                }
            });
        }
    });
    assert_eq!(count.count.load(Ordering::SeqCst), 100);
    assert_eq!(
        proxy.invoke("get_Balance", Vec::new()).unwrap().return_value(),
        Some(&json!(100))
    );
}

#[test]
fn proxy_creation_is_logged() {
    let (logs, _guard) = capture_logs();
    let journal = Journal::default();
    let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
    let _proxy = proxy(&intercept, 0, &journal, BehaviorSet::new());

    assert!(logs.has_message("proxy created"));
    assert!(logs.has_field("proxy", "interface"));
    assert!(logs.has_field("contract", "Bank.IAccount"));
}
