//! Load balancer controller, DNS and ingress state

use super::{PodCheck, Recorder, SmokeSuite};
use crate::checks;
use crate::k8s::ClusterApi;
use crate::models::ResourceQuery;
use crate::probe::EndpointProbe;

const LOAD_BALANCER_CONTROLLER: PodCheck = PodCheck::required(
    "aws-load-balancer",
    "app.kubernetes.io/name=aws-load-balancer-controller",
    "AWS LB Controller",
);

const EXTERNAL_DNS: PodCheck = PodCheck::required(
    "external-dns",
    "app.kubernetes.io/name=external-dns",
    "External DNS",
);

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub(crate) async fn check_networking(&self, out: &mut Recorder<'_>) {
        out.section("AWS Load Balancer Controller");
        self.check_pods(out, &LOAD_BALANCER_CONTROLLER).await;

        out.section("External DNS");
        self.check_pods(out, &EXTERNAL_DNS).await;

        out.section("Ingresses");
        let ingresses = self.cluster.list_ingresses(&ResourceQuery::all()).await;
        out.record(checks::ingress_summary(ingresses));
    }
}
