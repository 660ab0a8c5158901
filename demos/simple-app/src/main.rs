use bootseq::prelude::*;
use tracing_subscriber::EnvFilter;

/// Logs how long each part of startup took
struct StartupTimer {
    started: std::sync::Mutex<Option<std::time::Instant>>,
}

#[async_trait]
impl RunListener for StartupTimer {
    async fn starting(&self) -> anyhow::Result<()> {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(std::time::Instant::now());
        }
        Ok(())
    }

    async fn started(&self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        let elapsed = self
            .started
            .lock()
            .ok()
            .and_then(|started| started.map(|s| s.elapsed()));
        tracing::info!("⏱️ Context {} refreshed after {:?}", context.id(), elapsed);
        Ok(())
    }

    async fn failed(
        &self,
        _context: Option<&mut ApplicationContext>,
        failure: &BootError,
    ) -> anyhow::Result<()> {
        tracing::warn!("Startup aborted: {}", failure);
        Ok(())
    }

    fn order(&self) -> i32 {
        HIGHEST_PRECEDENCE
    }
}

struct Greeter(String);

/// Host steps: standard environment handling plus a bean and a runner
struct DemoBootstrap {
    standard: StandardBootstrap,
}

#[async_trait]
impl BootstrapSteps for DemoBootstrap {
    async fn prepare_environment(&mut self) -> anyhow::Result<Environment> {
        self.standard.prepare_environment().await
    }

    async fn create_context(
        &mut self,
        environment: Environment,
    ) -> anyhow::Result<ApplicationContext> {
        self.standard.create_context(environment).await
    }

    async fn load_context(&mut self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        let greeting = context.environment().get_or("demo.greeting", "hello").to_string();
        context.register_bean("greeter", Greeter(greeting))?;
        Ok(())
    }

    async fn call_runners(&mut self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        let greeter = context.get_bean::<Greeter>()?;
        tracing::info!("👋 {} from {}", greeter.0, context.display_name());
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = Application::builder()
        .name("simple-app")
        .default_property("demo.greeting", "hello")
        .listener(StartupTimer {
            started: std::sync::Mutex::new(None),
        })
        .listener(
            CallbackListener::new("greeting-override").on_environment_prepared(|environment| {
                if environment.accepts_profile("loud") {
                    environment.set_property("demo.greeting", "HELLO");
                }
                Ok(())
            }),
        )
        .build()
        .expect("Invalid application settings");

    let mut steps = DemoBootstrap {
        standard: StandardBootstrap::new(app.settings().clone()),
    };

    match app.run_with(&mut steps).await {
        Ok(running) => {
            tracing::info!("✅ Running, press Ctrl+C to stop");
            running.wait_for_shutdown().await;
        }
        Err(report) => {
            tracing::error!("❌ {}: {}", report, report.primary());
            for suppressed in report.suppressed() {
                tracing::error!("   suppressed: {}", suppressed);
            }
            std::process::exit(1);
        }
    }
}
