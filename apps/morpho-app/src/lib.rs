// morpho-app: Quadruped demo scene and CLI entry point.

pub mod scene;
