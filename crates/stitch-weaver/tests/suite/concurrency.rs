use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use stitch_classfile::{ClassMetadata, MethodMetadata};
use stitch_config::MixinConfig;
use stitch_value::{Thrown, Value};
use stitch_weaver::{Advice, HookImpls, InstanceMixins, MixinInstance, MixinType, Weaver};

use super::fixtures::advice_config;

const THREADS: usize = 8;

#[test]
fn racing_threads_share_one_join_point() {
    let weaver = Weaver::new(
        vec![Advice::new(advice_config("all", "com.acme.*", "*"), &HookImpls::new()).unwrap()],
        Vec::new(),
        Vec::new(),
    );
    weaver.register_class(
        ClassMetadata::new("com.acme.Hot").with_method(MethodMetadata::new("run", "()V")),
    );

    let barrier = Barrier::new(THREADS);
    let resolved: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    weaver.resolve_join_point("com.acme.Hot", "run", "()V").unwrap().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for join_point in &resolved[1..] {
        assert!(Arc::ptr_eq(&resolved[0], join_point));
    }
}

#[test]
fn mixin_init_runs_once_under_contention() {
    let inits = Arc::new(AtomicUsize::new(0));
    let config = MixinConfig {
        name: "traced".into(),
        targets: vec!["com.acme.Hot".into()],
        fields: [("hits".to_owned(), "int".to_owned())].into_iter().collect(),
        init: true,
        ..MixinConfig::default()
    };
    let counter = Arc::clone(&inits);
    let mixin = MixinType::new(
        config,
        Some(Arc::new(move |instance: &MixinInstance| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::yield_now();
            instance.set("hits", Value::Int(100));
            Ok::<(), Thrown>(())
        })),
    )
    .unwrap();
    let weaver = Weaver::new(Vec::new(), vec![mixin], Vec::new());
    weaver.register_class(ClassMetadata::new("com.acme.Hot"));

    let instance: InstanceMixins = weaver.instance_mixins("com.acme.Hot");
    let barrier = Barrier::new(THREADS);
    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                barrier.wait();
                let state = instance.get("traced").unwrap();
                assert_eq!(state.get("hits"), Some(Value::Int(100)));
            });
        }
    });

    assert_eq!(inits.load(Ordering::SeqCst), 1);
}
