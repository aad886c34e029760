/// Trait for configurations that know how to assemble a runtime value.
pub trait Build {
    /// The value assembled from this configuration.
    type Output;

    /// The reason why the configuration could not be assembled.
    type Error;

    /// Consumes the configuration and assembles [`Build::Output`].
    fn build(self) -> Result<Self::Output, Self::Error>;
}
