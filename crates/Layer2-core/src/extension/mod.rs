//! Extension System - 확장 등록, 의존성 해결, 디스크 발견
//!
//! ## 구조
//!
//! - [`ExtensionManifest`]: ID, 표시 정보, 선언된 의존성, 설정 값
//! - [`ExtensionDescriptor`]: 매니페스트 + 훅 구현 (등록 단위)
//! - [`ExtensionRegistry`]: 등록 순서 유지, 의존성 체인 계산/검증
//! - [`ExtensionDiscovery`]: `*.extension.json` 선언 파일 발견
//!
//! 훅을 하나도 구현하지 않은 확장도 등록할 수 있다. 이런 확장은 다른 확장의
//! 순서 제약에만 참여한다.

mod chain;
mod descriptor;
mod discovery;
mod manifest;
mod registry;

pub use chain::DependencyChain;
pub use descriptor::ExtensionDescriptor;
pub use discovery::{DiscoveredExtension, ExtensionDiscovery};
pub use manifest::ExtensionManifest;
pub use registry::{ExtensionInfo, ExtensionRegistry};
