use crate::config::RuntimeConfig;
use crate::infrastructure::model::{DeviceProbe, TripoSrRuntime};

/// 推論ランタイムの状態を表示するユースケース
pub struct ShowRuntimeInfoUseCase {
    config: RuntimeConfig,
    probe: DeviceProbe,
}

impl ShowRuntimeInfoUseCase {
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_probe(config, DeviceProbe::new())
    }

    pub fn with_probe(config: RuntimeConfig, probe: DeviceProbe) -> Self {
        Self { config, probe }
    }

    /// ランタイムが利用可能なら `true`
    ///
    /// モックでない場合は `serve` と同じくモデルを実際にロードして確認する。
    pub async fn execute(&self) -> bool {
        println!("🔍 Runtime Information");
        println!("======================");

        let accelerator = self.probe.accelerator_available().await;
        let device = DeviceProbe::resolve(self.config.device, accelerator);
        println!("\n🖥  Device:");
        println!(
            "   CUDA accelerator: {}",
            if accelerator { "✅ Available" } else { "❌ Not found" }
        );
        println!("   Preference: {}", self.config.device);
        println!("   Selected: {}", device);

        println!("\n📦 Model:");
        println!("   Pretrained model: {}", self.config.pretrained_model);
        println!("   Chunk size: {}", self.config.chunk_size);

        if self.config.mock {
            println!("\n⚠️  Mock gateway enabled; the TripoSR runtime is not used.");
            return true;
        }

        println!("\n🔧 Runtime:");
        println!("   Python: {}", self.config.python.display());
        println!("   TripoSR checkout: {}", self.config.triposr_dir.display());
        println!("   Loading model, this can take a while...");

        match TripoSrRuntime::load(self.config.clone(), device).await {
            Ok(runtime) => {
                println!("   Package ({}): ✅ OK", runtime.package_dir().display());
                println!("   Model: ✅ Loaded");
                true
            }
            Err(e) => {
                println!("   TripoSR runtime: ❌ {}", e);
                false
            }
        }
    }
}
