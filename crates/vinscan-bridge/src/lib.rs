// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vinscan — capability interfaces between the scan session and the platform.
//
// Camera, render surface, vision preprocessing, recognition engines and the
// vehicle registry are all injected through the traits in `traits`. The
// `stub` module fills every slot for builds with no native backend.

pub mod stub;
pub mod surface;
pub mod traits;

use std::sync::Arc;

pub use surface::VideoSurface;
pub use traits::*;

/// Capability bundle for the current build.
///
/// With no native backend compiled in this is the stub bundle: starting a
/// session fails with `PlatformUnavailable` and lookups return nothing.
pub fn platform_capabilities() -> ScanCapabilities {
    let text: Arc<dyn TextEngineFactory> =
        Arc::new(|| Box::new(stub::StubTextRecognizer) as Box<dyn TextRecognizer>);
    let code: Arc<dyn CodeEngineFactory> =
        Arc::new(|| Box::new(stub::StubCodeRecognizer) as Box<dyn CodeRecognizer>);
    ScanCapabilities {
        camera: Arc::new(stub::StubBridge),
        vision: None,
        text_engines: text,
        code_engines: code,
        registry: Arc::new(stub::StubBridge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vinscan_core::VinScanError;
    use vinscan_core::vin::Vin;

    #[tokio::test]
    async fn stub_camera_is_unavailable() {
        let caps = platform_capabilities();
        assert!(matches!(
            caps.camera.request_stream(None).await,
            Err(VinScanError::PlatformUnavailable)
        ));
    }

    #[tokio::test]
    async fn stub_registry_knows_nothing() {
        let caps = platform_capabilities();
        let vin = Vin::parse("1HGCM82633A004352").unwrap();
        assert_eq!(caps.registry.decode(&vin).await.unwrap(), None);
    }

    #[tokio::test]
    async fn stub_engines_refuse_to_start() {
        let caps = platform_capabilities();
        let mut text = caps.text_engines.create();
        assert!(
            text.initialize(&LanguageProfile::default(), &TextEngineParams::vin())
                .await
                .is_err()
        );
        let mut code = caps.code_engines.create();
        assert!(code.initialize(&[]).await.is_err());
    }
}
